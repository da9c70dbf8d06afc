//! Client-facing route surface.

pub mod events;
pub mod health;
pub mod intents;
pub mod logs;
pub mod queue;
pub mod sync;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use taskbridge_core::tasks::service::AdmissionMode;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Shared state handed to every handler.
pub type Ctx = Arc<AppContext>;

/// Query options shared by the admitting routes. Direct creates default to
/// advisory; the blocking flag is the explicit opt-in for legacy
/// hard-rejection semantics.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct AdmitOptions {
    pub blocking: bool,
}

impl AdmitOptions {
    pub fn mode(self) -> AdmissionMode {
        if self.blocking {
            AdmissionMode::Blocking
        } else {
            AdmissionMode::Advisory
        }
    }
}

/// Build the full application router.
pub fn router(ctx: Ctx) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/users/{user_id}", post(users::create_user))
        .route(
            "/api/users/{user_id}/tasks",
            post(tasks::create_task).get(tasks::list_tasks),
        )
        .route("/api/users/{user_id}/tasks/batch", post(tasks::create_batch))
        .route(
            "/api/users/{user_id}/tasks/{task_id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .patch(tasks::patch_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/users/{user_id}/tasks/{task_id}/occurrences",
            get(tasks::occurrences),
        )
        .route("/api/users/{user_id}/conflict-check", post(tasks::conflict_check))
        .route("/api/users/{user_id}/queue", get(queue::list_queue))
        .route("/api/users/{user_id}/queue/{entry_id}/approve", post(queue::approve))
        .route("/api/users/{user_id}/queue/{entry_id}/reject", post(queue::reject))
        .route(
            "/api/users/{user_id}/boundary-policy",
            get(users::get_boundary_policy).put(users::set_boundary_policy),
        )
        .route(
            "/api/users/{user_id}/week-offset",
            get(users::get_week_offset).put(users::set_week_offset),
        )
        .route("/api/users/{user_id}/logs", get(logs::list_logs))
        .route("/api/users/{user_id}/events", get(events::events))
        .route("/api/users/{user_id}/intents", post(intents::submit_intent))
        .route("/api/users/{user_id}/timetable/import", post(sync::import_timetable))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
