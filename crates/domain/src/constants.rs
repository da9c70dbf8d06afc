//! Domain constants.

/// Hard cap on generated occurrences when a recurrence rule carries neither
/// `count` nor `until`.
pub const RECURRENCE_SAFETY_CEILING: usize = 30;

/// Maximum page size the task listing query will serve.
pub const MAX_QUERY_LIMIT: u32 = 500;

/// Page size used when a listing request does not name one.
pub const DEFAULT_QUERY_LIMIT: u32 = 100;

/// Maximum tasks handed to the external task-list push per cycle.
pub const EXPORT_BATCH_LIMIT: usize = 50;

/// Id prefix applied to timetable-sourced tasks so a whole import batch can
/// be retracted by pattern.
pub const TIMETABLE_ID_PREFIX: &str = "timetable-";
