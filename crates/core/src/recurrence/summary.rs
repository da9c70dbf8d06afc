//! Expansion result reporting.

use serde::{Deserialize, Serialize};
use taskbridge_domain::RecurrenceRule;

/// Counts reported back to the caller after a batch of occurrences has been
/// persisted. The counts are supplied by the call site, since persistence
/// and per-occurrence conflict checking happen there, not in the expander.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionSummary {
    pub created_count: usize,
    pub conflict_count: usize,
    pub error_count: usize,
    pub requested_rule: RecurrenceRule,
}

impl ExpansionSummary {
    pub fn new(requested_rule: RecurrenceRule) -> Self {
        Self { created_count: 0, conflict_count: 0, error_count: 0, requested_rule }
    }

    pub fn record_created(&mut self) {
        self.created_count += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflict_count += 1;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }
}
