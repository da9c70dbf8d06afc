//! Timetable import trigger.

use axum::extract::{Path, State};
use axum::Json;
use taskbridge_domain::TaskBridgeError;
use taskbridge_infra::integrations::timetable::ImportSummary;

use super::Ctx;
use crate::error::ApiError;

pub async fn import_timetable(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
) -> Result<Json<ImportSummary>, ApiError> {
    let importer = ctx.importer.as_ref().ok_or_else(|| {
        TaskBridgeError::InvalidInput("outbound sync is disabled; no timetable importer".into())
    })?;
    Ok(Json(importer.import(&user_id).await?))
}
