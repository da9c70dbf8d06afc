//! Audit trail routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use taskbridge_domain::UserLogEntry;

use super::Ctx;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn list_logs(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<UserLogEntry>>, ApiError> {
    Ok(Json(ctx.logs.list_for_user(&user_id, query.limit).await?))
}
