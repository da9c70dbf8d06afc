//! Outbound calendar adapter.
//!
//! Mirrors admitted tasks into the user's mailbox calendar. The wire shape
//! is a minimal JSON projection; the real protocol detail lives behind the
//! collaborator service.

use async_trait::async_trait;
use serde_json::json;
use taskbridge_core::tasks::ports::CalendarGateway;
use taskbridge_domain::{Result, Task, TaskBridgeError};
use tracing::{debug, instrument};

use crate::errors::to_domain;

/// HTTP implementation of [`CalendarGateway`].
pub struct ExchangeCalendarClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeCalendarClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[async_trait]
impl CalendarGateway for ExchangeCalendarClient {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn create_event(&self, task: &Task) -> Result<()> {
        let payload = json!({
            "subject": task.name,
            "body": task.description,
            "start": task.start_time,
            "end": task.end_time,
            "location": task.location,
            "attendees": task.attendees,
            "importance": task.importance,
            "reminder": task.reminder,
        });

        let response = self
            .http
            .post(format!("{}/calendar/events", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(to_domain)?;

        if !response.status().is_success() {
            return Err(TaskBridgeError::Network(format!(
                "calendar entry rejected with status {}",
                response.status()
            )));
        }

        debug!(user_id = %task.user_id, "calendar entry created");
        Ok(())
    }
}
