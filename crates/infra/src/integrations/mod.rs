//! Thin adapters for external collaborators.
//!
//! These are replaceable I/O shims: they speak a minimal JSON dialect to
//! each service and convert to/from domain shapes at the boundary. Failures
//! here are caught, logged, and never allowed to abort the admission path
//! for the primary entity.

pub mod assistant;
pub mod exchange;
pub mod mstodo;
pub mod timetable;

use serde::{Deserialize, Serialize};
use taskbridge_domain::{Importance, TaskDraft};

pub use exchange::ExchangeCalendarClient;
pub use mstodo::MsTodoClient;
pub use timetable::{TimetableClient, TimetableImporter};

/// The normalized event shape every inbound source (mailbox calendar,
/// timetable portal) is reduced to before it touches the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedEvent {
    pub id: String,
    pub name: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: String,
    pub body: String,
    pub attendees: Vec<String>,
    pub importance: Importance,
    pub reminder: bool,
}

impl Default for NormalizedEvent {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            start: None,
            end: None,
            location: String::new(),
            body: String::new(),
            attendees: Vec::new(),
            importance: Importance::Normal,
            reminder: false,
        }
    }
}

impl NormalizedEvent {
    /// Convert into an admission draft, optionally forcing the task id so a
    /// whole source batch stays retractable by pattern.
    pub fn into_draft(self, forced_id: Option<String>) -> TaskDraft {
        TaskDraft {
            id: forced_id,
            name: self.name,
            description: self.body,
            location: self.location,
            attendees: self.attendees,
            importance: self.importance,
            reminder: self.reminder,
            start_time: self.start,
            end_time: self.end.clone(),
            due_date: self.end,
            ..TaskDraft::default()
        }
    }
}
