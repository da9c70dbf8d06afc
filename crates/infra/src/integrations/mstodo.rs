//! External task-list adapter.
//!
//! Hands off a trimmed projection of a task exactly once; the
//! `pushed_to_mstodo` latch on the task row (set by the caller after a
//! confirmed push) guarantees no re-push.

use async_trait::async_trait;
use serde_json::json;
use taskbridge_core::tasks::ports::TaskExportGateway;
use taskbridge_domain::{Result, Task, TaskBridgeError};
use tracing::{debug, instrument};

use crate::errors::to_domain;

/// HTTP implementation of [`TaskExportGateway`].
pub struct MsTodoClient {
    http: reqwest::Client,
    base_url: String,
}

impl MsTodoClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[async_trait]
impl TaskExportGateway for MsTodoClient {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn push_task(&self, task: &Task) -> Result<()> {
        let payload = json!({
            "name": task.name,
            "description": task.description,
            "due": task.due_date,
            "start": task.start_time,
            "importance": task.importance,
            "completed": task.completed,
        });

        let response = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(to_domain)?;

        if !response.status().is_success() {
            return Err(TaskBridgeError::Network(format!(
                "task list push rejected with status {}",
                response.status()
            )));
        }

        debug!(user_id = %task.user_id, "task pushed to external list");
        Ok(())
    }
}
