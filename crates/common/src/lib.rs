//! Shared utilities for taskbridge crates.
//!
//! This crate carries the pieces every other layer leans on:
//! - `storage`: r2d2-backed SQLite connection pooling with pragma tuning
//! - `resilience`: bounded retry execution for flaky outbound calls
//! - `time`: lenient datetime parsing normalized to UTC
//!
//! No taskbridge crate dependencies are allowed here.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod resilience;
pub mod storage;
pub mod time;

pub use resilience::{retry_with_config, BackoffStrategy, RetryConfig, RetryError};
pub use storage::{SqlitePool, SqlitePoolConfig, StorageError, StorageResult};
pub use time::parse_flexible;
