//! Routing of validated assistant intents.
//!
//! Create-class intents are the only ones acting on unreviewed content, so
//! they go through the approval gate. Query, update, and delete intents act
//! on tasks the user already owns and take the direct admission path in
//! advisory mode.

use std::sync::Arc;

use chrono::Utc;
use taskbridge_common::time::parse_flexible;
use taskbridge_domain::{
    ChangeEvent, IntentOutcome, LogKind, QueuedRequest, Result, Task, TaskBridgeError,
    ToolIntent, UserLogEntry,
};
use tracing::instrument;

use crate::approval::ApprovalService;
use crate::tasks::ports::{AuditLogRepository, ChangeNotifier};
use crate::tasks::query::TaskQuery;
use crate::tasks::service::{AdmissionMode, SchedulingService};

/// Dispatches one validated intent to the right path.
pub struct IntentRouter {
    scheduler: Arc<SchedulingService>,
    approvals: Arc<ApprovalService>,
    logs: Arc<dyn AuditLogRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl IntentRouter {
    pub fn new(
        scheduler: Arc<SchedulingService>,
        approvals: Arc<ApprovalService>,
        logs: Arc<dyn AuditLogRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self { scheduler, approvals, logs, notifier }
    }

    #[instrument(skip(self, intent))]
    pub async fn route(&self, user_id: &str, intent: ToolIntent) -> Result<IntentOutcome> {
        match intent {
            ToolIntent::CreateTask { draft, source } => {
                let entry =
                    self.approvals.enqueue(user_id, QueuedRequest { draft, source }).await?;
                Ok(IntentOutcome::Queued { entry_id: entry.id })
            }
            ToolIntent::UpdateTask { id, patch } => {
                let outcome =
                    self.scheduler.patch(user_id, &id, patch, AdmissionMode::Advisory).await?;
                Ok(IntentOutcome::Updated {
                    task: outcome.task.summary(),
                    conflicts: outcome.conflicts,
                })
            }
            ToolIntent::DeleteTask { id } => {
                let removed = self.scheduler.delete(user_id, &id, false).await?;
                Ok(IntentOutcome::Deleted { id, removed })
            }
            ToolIntent::QuerySchedule { start, end } => {
                let window_start = parse_flexible(&start).ok_or_else(|| {
                    TaskBridgeError::InvalidInput(format!("unparseable window start: {start:?}"))
                })?;
                let window_end = parse_flexible(&end).ok_or_else(|| {
                    TaskBridgeError::InvalidInput(format!("unparseable window end: {end:?}"))
                })?;
                let tasks = self
                    .scheduler
                    .list(user_id, &TaskQuery::window(window_start, window_end))
                    .await?;
                Ok(IntentOutcome::Schedule { tasks: tasks.iter().map(Task::summary).collect() })
            }
            ToolIntent::ReportTime => Ok(IntentOutcome::CurrentTime { now: Utc::now() }),
            ToolIntent::LogNote { note } => {
                let entry =
                    UserLogEntry::new(user_id, LogKind::Note, note, serde_json::Value::Null);
                self.logs.append(&entry).await?;
                self.notifier.publish(user_id, ChangeEvent::LogAppended { entry });
                Ok(IntentOutcome::Noted)
            }
        }
    }
}
