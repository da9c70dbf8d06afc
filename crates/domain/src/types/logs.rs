//! Append-only per-user audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskCompleted,
    QueueEnqueued,
    QueueApproved,
    QueueRejected,
    ImportBatch,
    Note,
}

/// One immutable audit record scoped to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLogEntry {
    pub id: String,
    pub user_id: String,
    pub time: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
    /// Structured context, e.g. the task summary the entry refers to
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl UserLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        kind: LogKind,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            time: Utc::now(),
            kind,
            message: message.into(),
            payload,
        }
    }
}
