//! Task admission path and its port interfaces.

pub mod draft;
pub mod ports;
pub mod query;
pub mod service;

pub use ports::{
    AffectedIds, AuditLogRepository, CalendarGateway, ChangeNotifier, QueueRepository,
    TaskExportGateway, TaskRepository, UserRepository,
};
pub use query::{SortField, SortOrder, TaskQuery};
pub use service::{AdmissionMode, AdmissionOutcome, SchedulingService};
