//! Resilience primitives for outbound calls.
//!
//! External services (mail, task list, timetable portal) fail routinely;
//! callers wrap those calls in a bounded retry so failures stay inspectable
//! instead of hiding inside self-rescheduling closures.

pub mod retry;

pub use retry::{retry_with_config, BackoffStrategy, RetryConfig, RetryError};
