//! Error types used throughout the application.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::task::TaskSummary;

/// Main error type for taskbridge
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum TaskBridgeError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Schedule conflict: {0}")]
    Conflict(ConflictDetails),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for taskbridge operations
pub type Result<T> = std::result::Result<T, TaskBridgeError>;

/// Payload of a blocking-mode conflict rejection: the candidate that was
/// refused and every existing task it overlaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictDetails {
    pub candidate: TaskSummary,
    pub conflicts: Vec<TaskSummary>,
}

impl fmt::Display for ConflictDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" overlaps {} existing task(s)",
            self.candidate.name,
            self.conflicts.len()
        )
    }
}
