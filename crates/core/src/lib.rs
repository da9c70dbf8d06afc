//! # Taskbridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The conflict detector and recurrence expander (pure functions)
//! - Port/adapter interfaces (traits)
//! - The admission path, per-user cache, approval gate, and intent router
//!
//! ## Architecture Principles
//! - Only depends on `taskbridge-common` and `taskbridge-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod approval;
pub mod cache;
pub mod conflict;
pub mod intents;
pub mod recurrence;
pub mod tasks;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use approval::ApprovalService;
pub use cache::UserTaskCache;
pub use conflict::{assert_no_conflict, find_conflicts};
pub use intents::IntentRouter;
pub use recurrence::{expand, ExpansionSummary};
pub use tasks::ports::{
    AffectedIds, AuditLogRepository, CalendarGateway, ChangeNotifier, QueueRepository,
    TaskExportGateway, TaskRepository, UserRepository,
};
pub use tasks::query::{SortField, SortOrder, TaskQuery};
pub use tasks::{AdmissionMode, AdmissionOutcome, SchedulingService};
