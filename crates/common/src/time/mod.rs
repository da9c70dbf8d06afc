//! Lenient datetime parsing normalized to UTC.
//!
//! Producers hand the system timestamps in whatever shape their source
//! emits: RFC 3339 with an offset, naive local-less datetimes, or bare
//! dates. Everything is normalized to an absolute UTC instant before it
//! reaches persistence; inputs that fit none of the accepted shapes parse
//! to `None` rather than erroring.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a datetime string into a UTC instant.
///
/// Accepted shapes, in order:
/// 1. RFC 3339 / ISO 8601 with an explicit offset (`2026-03-01T09:00:00+08:00`)
/// 2. Naive datetime, interpreted as already-UTC (`2026-03-01 09:00:00`)
/// 3. Bare date, interpreted as UTC midnight (`2026-03-01`)
pub fn parse_flexible(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Parse an optional datetime string; `None` and unparseable both map to `None`.
pub fn parse_optional(input: Option<&str>) -> Option<DateTime<Utc>> {
    input.and_then(parse_flexible)
}
