//! Approval gate routes.
//!
//! The path user id is the authenticated identity; the approval service
//! refuses to resolve entries owned by anyone else.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use taskbridge_core::tasks::service::AdmissionOutcome;
use taskbridge_domain::ScheduleQueueEntry;

use super::Ctx;
use crate::error::ApiError;

pub async fn list_queue(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ScheduleQueueEntry>>, ApiError> {
    Ok(Json(ctx.approvals.list(&user_id).await?))
}

pub async fn approve(
    State(ctx): State<Ctx>,
    Path((user_id, entry_id)): Path<(String, String)>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    Ok(Json(ctx.approvals.approve(&user_id, &entry_id).await?))
}

pub async fn reject(
    State(ctx): State<Ctx>,
    Path((user_id, entry_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    ctx.approvals.reject(&user_id, &entry_id).await?;
    Ok(Json(json!({ "rejected": entry_id })))
}
