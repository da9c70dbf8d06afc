//! Assistant intent ingress.
//!
//! The raw tool-call payload is validated into a typed intent at this
//! boundary; the router then decides whether it goes through the approval
//! queue or the direct admission path.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use taskbridge_domain::IntentOutcome;
use taskbridge_infra::integrations::assistant::parse_intent;

use super::Ctx;
use crate::error::ApiError;

pub async fn submit_intent(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(raw): Json<Value>,
) -> Result<Json<IntentOutcome>, ApiError> {
    let intent = parse_intent(raw)?;
    Ok(Json(ctx.intents.route(&user_id, intent).await?))
}
