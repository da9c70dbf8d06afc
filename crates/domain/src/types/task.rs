//! Task entity and its producer-facing input shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TaskBridgeError};
use crate::types::recurrence::{Frequency, RecurrenceRule};

/// Task importance, mirroring the mail source's vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Normal,
    Low,
}

/// Redundant classification of the recurrence family, kept alongside the
/// rule so queries can filter without parsing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    Single,
    RecurringDaily,
    RecurringWeekly,
    RecurringWeeklyByWeekNumber,
    RecurringDailyOnDays,
}

impl ScheduleType {
    /// The schedule type a rule implies.
    pub fn from_rule(rule: &RecurrenceRule) -> Self {
        match rule.freq {
            Frequency::Daily => ScheduleType::RecurringDaily,
            Frequency::Weekly => ScheduleType::RecurringWeekly,
            Frequency::WeeklyByWeekNumber => ScheduleType::RecurringWeeklyByWeekNumber,
            Frequency::DailyOnDays => ScheduleType::RecurringDailyOnDays,
        }
    }
}

/// Resolve the declared schedule type against an optional rule.
///
/// When only one side is supplied the other is derived; when both are
/// supplied and disagree the input is rejected unless `force` is set, in
/// which case the declared value wins.
pub fn resolve_schedule_type(
    declared: Option<ScheduleType>,
    rule: Option<&RecurrenceRule>,
    force: bool,
) -> Result<ScheduleType> {
    match (declared, rule) {
        (None, None) => Ok(ScheduleType::Single),
        (Some(declared), None) => Ok(declared),
        (None, Some(rule)) => Ok(ScheduleType::from_rule(rule)),
        (Some(declared), Some(rule)) => {
            let derived = ScheduleType::from_rule(rule);
            if declared == derived || force {
                Ok(declared)
            } else {
                Err(TaskBridgeError::InvalidInput(format!(
                    "scheduleType {declared:?} disagrees with recurrence rule (implies {derived:?})"
                )))
            }
        }
    }
}

/// A time-boxed unit of work or event.
///
/// Temporal fields are absolute UTC instants; producers normalize input
/// representations before a `Task` exists. A task is a root (no
/// `parent_task_id`) or a generated occurrence pointing at its root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub reminder: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub pushed_to_mstodo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether this task is a root (may own a recurrence rule).
    pub fn is_root(&self) -> bool {
        self.parent_task_id.is_none()
    }

    /// Both interval endpoints, when present.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start_time?, self.end_time?))
    }

    /// Trimmed projection for notifications and conflict reports.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            completed: self.completed,
        }
    }
}

/// Trimmed task projection pushed over the notification channel and carried
/// inside conflict errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Producer-facing creation shape.
///
/// Temporal fields are raw strings in whatever representation the producer
/// holds; the admission boundary normalizes them to UTC instants (or `None`
/// when unparseable). An explicit `id` is only honored for externally keyed
/// batches such as timetable imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub location: String,
    pub attendees: Vec<String>,
    pub importance: Importance,
    pub reminder: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub due_date: Option<String>,
    pub schedule_type: Option<ScheduleType>,
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Keep the declared `schedule_type` even when it disagrees with the rule
    pub force_schedule_type: bool,
    pub completed: bool,
}

/// Partial update shape; only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub attendees: Option<Vec<String>>,
    pub importance: Option<Importance>,
    pub reminder: Option<bool>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Whether applying this patch can change the task's interval, which is
    /// what decides if conflict detection has to re-run.
    pub fn touches_times(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}
