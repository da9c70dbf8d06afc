//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::Ctx;
use crate::error::ApiError;

pub async fn health(State(ctx): State<Ctx>) -> Result<Json<Value>, ApiError> {
    ctx.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}
