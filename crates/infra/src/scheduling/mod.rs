//! Background schedulers.
//!
//! Both schedulers follow the same lifecycle: `start` spawns a tokio task
//! running a `select!` loop over a cancellation token and a fixed interval;
//! `stop` cancels and awaits the task with a bounded join timeout.

pub mod error;
pub mod export_scheduler;
pub mod occurrence_scanner;

pub use error::{SchedulerError, SchedulerResult};
pub use export_scheduler::{ExportScheduler, ExportSchedulerConfig};
pub use occurrence_scanner::{OccurrenceScanner, OccurrenceScannerConfig};
