//! Scheduler lifecycle errors.

use std::time::Duration;

use thiserror::Error;

/// Errors from scheduler lifecycle management.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler is not running")]
    NotRunning,

    #[error("scheduler did not stop within {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
