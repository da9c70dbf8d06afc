//! Recurrence expansion.
//!
//! Turns a root task plus its rule into the concrete child occurrences.
//! Persistence of each occurrence happens one at a time at the call site;
//! the expander itself is pure.

pub mod expander;
pub mod summary;

pub use expander::expand;
pub use summary::ExpansionSummary;
