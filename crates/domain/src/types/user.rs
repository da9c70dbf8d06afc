//! User records.
//!
//! The user id is the partitioning key for every operation in the system;
//! no cross-user interaction ever occurs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conflict boundary policy, selectable per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Half-open `[start, end)` semantics: touching endpoints do not conflict
    #[default]
    Exclusive,
    /// Closed semantics: a task ending exactly when another begins conflicts
    Inclusive,
}

/// A user and their per-user scheduling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,
    /// Week-numbering offset between the calendar week and the institution's
    /// teaching week; kept per user for week-number-based schedules.
    #[serde(default)]
    pub week_offset: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
