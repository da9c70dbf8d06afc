//! Row/entity conversions shared by the SQLite repositories.
//!
//! Enum columns are stored as the same lowercase tokens the JSON surface
//! uses; timestamps are unix seconds, `NULL` when absent. A stored
//! recurrence rule that no longer parses degrades to `None` instead of
//! poisoning every read of that row.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Row;
use taskbridge_domain::{
    BoundaryPolicy, Importance, LogKind, QueueStatus, RecurrenceRule, ScheduleQueueEntry,
    ScheduleType, Task, UserLogEntry, UserRecord,
};
use tracing::warn;

pub(crate) fn ts_opt(value: Option<DateTime<Utc>>) -> Option<i64> {
    value.map(|dt| dt.timestamp())
}

pub(crate) fn dt(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}

pub(crate) fn dt_opt(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.map(dt)
}

pub(crate) fn boundary_policy_to_str(policy: BoundaryPolicy) -> &'static str {
    match policy {
        BoundaryPolicy::Exclusive => "exclusive",
        BoundaryPolicy::Inclusive => "inclusive",
    }
}

pub(crate) fn boundary_policy_from_str(raw: &str) -> BoundaryPolicy {
    match raw {
        "inclusive" => BoundaryPolicy::Inclusive,
        _ => BoundaryPolicy::Exclusive,
    }
}

pub(crate) fn importance_to_str(importance: Importance) -> &'static str {
    match importance {
        Importance::High => "high",
        Importance::Normal => "normal",
        Importance::Low => "low",
    }
}

pub(crate) fn importance_from_str(raw: &str) -> Importance {
    match raw {
        "high" => Importance::High,
        "low" => Importance::Low,
        _ => Importance::Normal,
    }
}

pub(crate) fn schedule_type_to_str(schedule_type: ScheduleType) -> &'static str {
    match schedule_type {
        ScheduleType::Single => "single",
        ScheduleType::RecurringDaily => "recurring_daily",
        ScheduleType::RecurringWeekly => "recurring_weekly",
        ScheduleType::RecurringWeeklyByWeekNumber => "recurring_weekly_by_week_number",
        ScheduleType::RecurringDailyOnDays => "recurring_daily_on_days",
    }
}

pub(crate) fn schedule_type_from_str(raw: &str) -> ScheduleType {
    match raw {
        "recurring_daily" => ScheduleType::RecurringDaily,
        "recurring_weekly" => ScheduleType::RecurringWeekly,
        "recurring_weekly_by_week_number" => ScheduleType::RecurringWeeklyByWeekNumber,
        "recurring_daily_on_days" => ScheduleType::RecurringDailyOnDays,
        _ => ScheduleType::Single,
    }
}

pub(crate) fn queue_status_to_str(status: QueueStatus) -> &'static str {
    match status {
        QueueStatus::Pending => "pending",
        QueueStatus::Approved => "approved",
        QueueStatus::Rejected => "rejected",
    }
}

pub(crate) fn queue_status_from_str(raw: &str) -> QueueStatus {
    match raw {
        "approved" => QueueStatus::Approved,
        "rejected" => QueueStatus::Rejected,
        _ => QueueStatus::Pending,
    }
}

pub(crate) fn log_kind_to_str(kind: LogKind) -> &'static str {
    match kind {
        LogKind::TaskCreated => "task_created",
        LogKind::TaskUpdated => "task_updated",
        LogKind::TaskDeleted => "task_deleted",
        LogKind::TaskCompleted => "task_completed",
        LogKind::QueueEnqueued => "queue_enqueued",
        LogKind::QueueApproved => "queue_approved",
        LogKind::QueueRejected => "queue_rejected",
        LogKind::ImportBatch => "import_batch",
        LogKind::Note => "note",
    }
}

pub(crate) fn log_kind_from_str(raw: &str) -> LogKind {
    match raw {
        "task_created" => LogKind::TaskCreated,
        "task_updated" => LogKind::TaskUpdated,
        "task_deleted" => LogKind::TaskDeleted,
        "task_completed" => LogKind::TaskCompleted,
        "queue_enqueued" => LogKind::QueueEnqueued,
        "queue_approved" => LogKind::QueueApproved,
        "queue_rejected" => LogKind::QueueRejected,
        "import_batch" => LogKind::ImportBatch,
        _ => LogKind::Note,
    }
}

/// Column list every task SELECT uses, in [`task_from_row`] order.
pub(crate) const TASK_COLUMNS: &str = "id, user_id, name, description, location, attendees, \
     importance, reminder, start_ts, end_ts, due_ts, schedule_type, recurrence_rule, \
     parent_task_id, completed, pushed_to_mstodo, created_at, updated_at";

pub(crate) fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let attendees_raw: String = row.get(5)?;
    let attendees = serde_json::from_str(&attendees_raw).unwrap_or_default();

    let importance_raw: String = row.get(6)?;
    let schedule_type_raw: String = row.get(11)?;

    let rule_raw: Option<String> = row.get(12)?;
    let recurrence_rule = rule_raw.and_then(|raw| match RecurrenceRule::from_json(&raw) {
        Ok(rule) => Some(rule),
        Err(err) => {
            warn!(error = %err, "stored recurrence rule no longer parses; ignoring");
            None
        }
    });

    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        attendees,
        importance: importance_from_str(&importance_raw),
        reminder: row.get(7)?,
        start_time: dt_opt(row.get(8)?),
        end_time: dt_opt(row.get(9)?),
        due_date: dt_opt(row.get(10)?),
        schedule_type: schedule_type_from_str(&schedule_type_raw),
        recurrence_rule,
        parent_task_id: row.get(13)?,
        completed: row.get(14)?,
        pushed_to_mstodo: row.get(15)?,
        created_at: dt(row.get(16)?),
        updated_at: dt(row.get(17)?),
    })
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let policy_raw: String = row.get(2)?;
    Ok(UserRecord {
        id: row.get(0)?,
        display_name: row.get(1)?,
        boundary_policy: boundary_policy_from_str(&policy_raw),
        week_offset: row.get(3)?,
        created_at: dt(row.get(4)?),
        updated_at: dt(row.get(5)?),
    })
}

pub(crate) fn queue_entry_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleQueueEntry> {
    let status_raw: String = row.get(3)?;
    Ok(ScheduleQueueEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        raw_request: row.get(2)?,
        status: queue_status_from_str(&status_raw),
        created_at: dt(row.get(4)?),
        updated_at: dt(row.get(5)?),
    })
}

pub(crate) fn log_entry_from_row(row: &Row<'_>) -> rusqlite::Result<UserLogEntry> {
    let kind_raw: String = row.get(3)?;
    let payload_raw: String = row.get(5)?;
    Ok(UserLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        time: dt(row.get(2)?),
        kind: log_kind_from_str(&kind_raw),
        message: row.get(4)?,
        payload: serde_json::from_str(&payload_raw).unwrap_or(serde_json::Value::Null),
    })
}
