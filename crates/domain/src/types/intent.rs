//! Structured intents emitted by the automated assistant.
//!
//! The LLM boundary hands the core untyped tool-call arguments; the infra
//! layer validates them into this tagged union before anything reaches the
//! admission path. Temporal fields stay raw strings here; normalization
//! happens where drafts are normalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::task::{TaskDraft, TaskPatch, TaskSummary};

/// One validated tool-call intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolIntent {
    /// Create a task, gated behind the approval queue
    CreateTask {
        draft: TaskDraft,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    /// Update fields on an existing task
    UpdateTask { id: String, patch: TaskPatch },
    /// Delete a task by id
    DeleteTask { id: String },
    /// Query the schedule inside a time window
    QuerySchedule { start: String, end: String },
    /// Report the current time
    ReportTime,
    /// Record an informational note in the audit trail
    LogNote { note: String },
}

/// Outcome reported back over the assistant reply channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    /// The create request was parked for human approval
    Queued { entry_id: String },
    Updated { task: TaskSummary, conflicts: Vec<TaskSummary> },
    Deleted { id: String, removed: bool },
    Schedule { tasks: Vec<TaskSummary> },
    CurrentTime { now: DateTime<Utc> },
    Noted,
}
