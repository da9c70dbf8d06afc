//! SQLite storage primitives.
//!
//! Provides the pooled connection handling used by every repository in the
//! infra layer. The pool applies WAL mode, foreign keys, and a busy timeout
//! to each connection it hands out.

pub mod error;
pub mod pool;

pub use error::{StorageError, StorageResult};
pub use pool::{SqlitePool, SqlitePoolConfig};
