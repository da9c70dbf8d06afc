//! Schedule queue / approval gate.
//!
//! Producers without direct trust (an automated assistant acting on
//! unreviewed email content, or a third-party API caller) never reach the
//! admission path themselves. Their serialized requests park here until the
//! owning user approves (replaying the request through the trusted
//! admission path) or rejects (dropping it).

pub mod service;

pub use service::ApprovalService;
