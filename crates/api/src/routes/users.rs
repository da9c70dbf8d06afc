//! User creation and per-user scheduling settings.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskbridge_domain::{BoundaryPolicy, TaskBridgeError, UserRecord};

use super::Ctx;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub display_name: String,
}

pub async fn create_user(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    let now = Utc::now();
    let user = UserRecord {
        id: user_id,
        display_name: request.display_name,
        boundary_policy: BoundaryPolicy::default(),
        week_offset: 0,
        created_at: now,
        updated_at: now,
    };
    ctx.scheduler.ensure_user(&user).await?;
    Ok(Json(user))
}

async fn require_user(ctx: &Ctx, user_id: &str) -> Result<UserRecord, ApiError> {
    Ok(ctx
        .users
        .find_user(user_id)
        .await?
        .ok_or_else(|| TaskBridgeError::NotFound(format!("user {user_id}")))?)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoundaryPolicyBody {
    pub boundary_policy: BoundaryPolicy,
}

pub async fn get_boundary_policy(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
) -> Result<Json<BoundaryPolicyBody>, ApiError> {
    let user = require_user(&ctx, &user_id).await?;
    Ok(Json(BoundaryPolicyBody { boundary_policy: user.boundary_policy }))
}

pub async fn set_boundary_policy(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(body): Json<BoundaryPolicyBody>,
) -> Result<Json<BoundaryPolicyBody>, ApiError> {
    ctx.users.set_boundary_policy(&user_id, body.boundary_policy).await?;
    Ok(Json(body))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeekOffsetBody {
    pub week_offset: i32,
}

pub async fn get_week_offset(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
) -> Result<Json<WeekOffsetBody>, ApiError> {
    let user = require_user(&ctx, &user_id).await?;
    Ok(Json(WeekOffsetBody { week_offset: user.week_offset }))
}

pub async fn set_week_offset(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(body): Json<WeekOffsetBody>,
) -> Result<Json<WeekOffsetBody>, ApiError> {
    ctx.users.set_week_offset(&user_id, body.week_offset).await?;
    Ok(Json(body))
}
