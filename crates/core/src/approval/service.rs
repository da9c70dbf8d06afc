//! Approval gate over the schedule queue.

use std::sync::Arc;

use serde_json::json;
use taskbridge_domain::{
    ChangeEvent, LogKind, QueuedRequest, Result, ScheduleQueueEntry, TaskBridgeError,
    UserLogEntry,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::tasks::ports::{AuditLogRepository, ChangeNotifier, QueueRepository};
use crate::tasks::service::{AdmissionMode, AdmissionOutcome, SchedulingService};

/// Gates schedule mutations from untrusted producers behind human approval.
pub struct ApprovalService {
    queue: Arc<dyn QueueRepository>,
    logs: Arc<dyn AuditLogRepository>,
    notifier: Arc<dyn ChangeNotifier>,
    scheduler: Arc<SchedulingService>,
}

impl ApprovalService {
    pub fn new(
        queue: Arc<dyn QueueRepository>,
        logs: Arc<dyn AuditLogRepository>,
        notifier: Arc<dyn ChangeNotifier>,
        scheduler: Arc<SchedulingService>,
    ) -> Self {
        Self { queue, logs, notifier, scheduler }
    }

    /// Park a request for the owning user's disposition.
    #[instrument(skip(self, request))]
    pub async fn enqueue(
        &self,
        user_id: &str,
        request: QueuedRequest,
    ) -> Result<ScheduleQueueEntry> {
        let now = chrono::Utc::now();
        let entry = ScheduleQueueEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            raw_request: request.to_json()?,
            status: taskbridge_domain::QueueStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.queue.enqueue(&entry).await?;

        self.audit(
            user_id,
            LogKind::QueueEnqueued,
            format!("Request \"{}\" awaiting approval", request.draft.name),
            json!({ "entry_id": entry.id, "source": request.source }),
        )
        .await?;

        info!(user_id, entry_id = %entry.id, "schedule request enqueued");
        Ok(entry)
    }

    /// A user's pending entries, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<ScheduleQueueEntry>> {
        self.queue.list_for_user(user_id).await
    }

    /// Replay the stored request through the full admission path.
    ///
    /// Approval never hard-blocks on conflict: the admission runs in
    /// advisory mode and any overlaps come back as warnings beside the
    /// created task. The entry is removed once the replay succeeds.
    #[instrument(skip(self))]
    pub async fn approve(&self, user_id: &str, entry_id: &str) -> Result<AdmissionOutcome> {
        let entry = self.owned_entry(user_id, entry_id).await?;
        let request = QueuedRequest::from_json(&entry.raw_request)?;

        let outcome =
            self.scheduler.admit(user_id, request.draft, AdmissionMode::Advisory).await?;

        self.queue.delete_entry(&entry.id).await?;
        self.audit(
            user_id,
            LogKind::QueueApproved,
            format!("Approved request for \"{}\"", outcome.task.name),
            json!({
                "entry_id": entry.id,
                "task_id": outcome.task.id,
                "conflicts": outcome.conflicts.len(),
            }),
        )
        .await?;

        Ok(outcome)
    }

    /// Drop the entry without creating anything.
    #[instrument(skip(self))]
    pub async fn reject(&self, user_id: &str, entry_id: &str) -> Result<()> {
        let entry = self.owned_entry(user_id, entry_id).await?;
        self.queue.delete_entry(&entry.id).await?;

        self.audit(
            user_id,
            LogKind::QueueRejected,
            "Rejected queued schedule request".to_string(),
            json!({ "entry_id": entry.id }),
        )
        .await?;

        Ok(())
    }

    /// Fetch an entry and enforce that only the owning user may act on it.
    async fn owned_entry(&self, user_id: &str, entry_id: &str) -> Result<ScheduleQueueEntry> {
        let entry = self
            .queue
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| TaskBridgeError::NotFound(format!("queue entry {entry_id}")))?;
        if entry.user_id != user_id {
            return Err(TaskBridgeError::Unauthorized(
                "queue entries may only be resolved by their owner".into(),
            ));
        }
        Ok(entry)
    }

    async fn audit(
        &self,
        user_id: &str,
        kind: LogKind,
        message: String,
        payload: serde_json::Value,
    ) -> Result<()> {
        let entry = UserLogEntry::new(user_id, kind, message, payload);
        self.logs.append(&entry).await?;
        self.notifier.publish(user_id, ChangeEvent::LogAppended { entry });
        Ok(())
    }
}
