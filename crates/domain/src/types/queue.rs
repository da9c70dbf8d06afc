//! Schedule queue entries awaiting human disposition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TaskBridgeError};
use crate::types::task::TaskDraft;

/// Queue entry state machine: `pending -> {approved, rejected}`, both
/// terminal. Entries are deleted on either terminal transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A serialized mutation request from an untrusted or automated producer,
/// parked until the owning user approves or rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleQueueEntry {
    pub id: String,
    pub user_id: String,
    /// JSON-serialized [`QueuedRequest`]
    pub raw_request: String,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The payload stored inside a queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub draft: TaskDraft,
    /// Context the requester attached, e.g. the source email subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl QueuedRequest {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TaskBridgeError::Internal(format!("failed to serialize request: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            TaskBridgeError::InvalidInput(format!("malformed queued request payload: {e}"))
        })
    }
}
