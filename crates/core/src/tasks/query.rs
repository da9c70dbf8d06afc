//! Task listing query shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskbridge_domain::constants::{DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT};

/// Sort field allow-list; anything else never reaches the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    StartTime,
    EndTime,
    DueDate,
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// The single paginated/filterable listing operation.
///
/// The window filter matches tasks overlapping `[window_start, window_end]`
/// (`end_time >= start AND start_time <= end`); the text filter is a
/// substring match over name, description, and location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskQuery {
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl TaskQuery {
    /// Window-only convenience constructor.
    pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { window_start: Some(start), window_end: Some(end), ..Self::default() }
    }

    /// The limit actually applied: a missing/zero limit falls back to the
    /// default page size, and nothing may exceed the cap.
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_QUERY_LIMIT
        } else {
            self.limit.min(MAX_QUERY_LIMIT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_falls_back_to_default() {
        assert_eq!(TaskQuery::default().effective_limit(), DEFAULT_QUERY_LIMIT);
    }

    #[test]
    fn oversized_limit_is_capped() {
        let query = TaskQuery { limit: 100_000, ..TaskQuery::default() };
        assert_eq!(query.effective_limit(), MAX_QUERY_LIMIT);
    }

    #[test]
    fn reasonable_limit_passes_through() {
        let query = TaskQuery { limit: 25, ..TaskQuery::default() };
        assert_eq!(query.effective_limit(), 25);
    }
}
