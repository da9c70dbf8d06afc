//! Change notification payloads.
//!
//! Delivered best-effort to connections authenticated as the owning user;
//! never broadcast across users.

use serde::{Deserialize, Serialize};

use crate::types::logs::UserLogEntry;
use crate::types::task::TaskSummary;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    Created,
    Updated,
    Deleted,
    Completed,
}

/// One event on a user's push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A task was mutated through the admission path
    TaskChanged { action: TaskAction, task: TaskSummary },
    /// An audit entry was appended
    LogAppended { entry: UserLogEntry },
    /// A task's start time has just elapsed
    OccurrenceStarting { task: TaskSummary },
    /// A task was completed before its start time arrived
    OccurrenceCanceled { task: TaskSummary },
}
