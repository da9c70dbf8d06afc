//! Task CRUD, listing, and conflict pre-check routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskbridge_common::time::parse_flexible;
use taskbridge_core::tasks::query::TaskQuery;
use taskbridge_core::tasks::service::{AdmissionMode, AdmissionOutcome};
use taskbridge_domain::{
    Importance, ScheduleType, Task, TaskDraft, TaskPatch, TaskSummary,
};
use uuid::Uuid;

use super::{AdmitOptions, Ctx};
use crate::error::ApiError;

pub async fn create_task(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Query(options): Query<AdmitOptions>,
    Json(draft): Json<TaskDraft>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    let outcome = ctx.scheduler.admit(&user_id, draft, options.mode()).await?;
    Ok(Json(outcome))
}

/// Batch creation outcome; every draft is admitted independently, so one
/// bad entry never sinks the rest.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub created: usize,
    pub conflicted: usize,
    pub failed: usize,
    pub tasks: Vec<TaskSummary>,
}

pub async fn create_batch(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(drafts): Json<Vec<TaskDraft>>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let mut outcome = BatchOutcome::default();
    for draft in drafts {
        match ctx.scheduler.admit(&user_id, draft, AdmissionMode::Advisory).await {
            Ok(admitted) => {
                outcome.created += 1;
                if !admitted.conflicts.is_empty() {
                    outcome.conflicted += 1;
                }
                outcome.tasks.push(admitted.task.summary());
            }
            Err(_) => outcome.failed += 1,
        }
    }
    Ok(Json(outcome))
}

pub async fn list_tasks(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(ctx.scheduler.list(&user_id, &query).await?))
}

pub async fn get_task(
    State(ctx): State<Ctx>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<Json<Task>, ApiError> {
    let task = ctx.scheduler.get(&user_id, &task_id).await?.ok_or_else(|| {
        taskbridge_domain::TaskBridgeError::NotFound(format!("task {task_id}"))
    })?;
    Ok(Json(task))
}

pub async fn update_task(
    State(ctx): State<Ctx>,
    Path((user_id, task_id)): Path<(String, String)>,
    Query(options): Query<AdmitOptions>,
    Json(draft): Json<TaskDraft>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    let outcome = ctx.scheduler.update(&user_id, &task_id, draft, options.mode()).await?;
    Ok(Json(outcome))
}

pub async fn patch_task(
    State(ctx): State<Ctx>,
    Path((user_id, task_id)): Path<(String, String)>,
    Query(options): Query<AdmitOptions>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    let outcome = ctx.scheduler.patch(&user_id, &task_id, patch, options.mode()).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    pub cascade: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub removed: bool,
}

pub async fn delete_task(
    State(ctx): State<Ctx>,
    Path((user_id, task_id)): Path<(String, String)>,
    Query(options): Query<DeleteOptions>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let removed = ctx.scheduler.delete(&user_id, &task_id, options.cascade).await?;
    Ok(Json(DeleteOutcome { removed }))
}

pub async fn occurrences(
    State(ctx): State<Ctx>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(ctx.scheduler.occurrences(&user_id, &task_id).await?))
}

/// A hypothetical interval to test against the user's current schedule.
#[derive(Debug, Deserialize)]
pub struct ConflictCheckRequest {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn conflict_check(
    State(ctx): State<Ctx>,
    Path(user_id): Path<String>,
    Json(request): Json<ConflictCheckRequest>,
) -> Result<Json<Vec<TaskSummary>>, ApiError> {
    let now = Utc::now();
    let candidate = Task {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.clone(),
        name: request.name.unwrap_or_else(|| "candidate".into()),
        description: String::new(),
        location: String::new(),
        attendees: Vec::new(),
        importance: Importance::Normal,
        reminder: false,
        start_time: parse_flexible(&request.start),
        end_time: parse_flexible(&request.end),
        due_date: None,
        schedule_type: ScheduleType::Single,
        recurrence_rule: None,
        parent_task_id: None,
        completed: false,
        pushed_to_mstodo: false,
        created_at: now,
        updated_at: now,
    };

    Ok(Json(ctx.scheduler.check_conflicts(&user_id, &candidate).await?))
}
