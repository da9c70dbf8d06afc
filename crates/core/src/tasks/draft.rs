//! Admission-boundary validation and normalization.
//!
//! Drafts arrive with raw string timestamps in whatever representation the
//! producer holds. Everything is normalized to absolute UTC instants here,
//! before any conflict check or persistence; strings that fit no accepted
//! shape normalize to `None` rather than failing the whole request.

use chrono::Utc;
use taskbridge_common::time::{parse_flexible, parse_optional};
use taskbridge_domain::task::resolve_schedule_type;
use taskbridge_domain::{Result, Task, TaskBridgeError, TaskDraft, TaskPatch};
use uuid::Uuid;

/// Validate a draft and normalize it into a persistable task owned by
/// `user_id`.
pub fn normalize_draft(draft: TaskDraft, user_id: &str) -> Result<Task> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(TaskBridgeError::InvalidInput("task name must not be empty".into()));
    }

    if let Some(rule) = &draft.recurrence_rule {
        rule.validate()?;
    }
    let schedule_type = resolve_schedule_type(
        draft.schedule_type,
        draft.recurrence_rule.as_ref(),
        draft.force_schedule_type,
    )?;

    let start_time = parse_optional(draft.start_time.as_deref());
    let end_time = parse_optional(draft.end_time.as_deref());
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            return Err(TaskBridgeError::InvalidInput(
                "endTime must not precede startTime".into(),
            ));
        }
    }

    let now = Utc::now();
    Ok(Task {
        id: draft.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        user_id: user_id.to_string(),
        name,
        description: draft.description,
        location: draft.location,
        attendees: draft.attendees,
        importance: draft.importance,
        reminder: draft.reminder,
        start_time,
        end_time,
        due_date: parse_optional(draft.due_date.as_deref()),
        schedule_type,
        recurrence_rule: draft.recurrence_rule,
        parent_task_id: None,
        completed: draft.completed,
        pushed_to_mstodo: false,
        created_at: now,
        updated_at: now,
    })
}

/// Apply a partial update on top of an existing task.
///
/// Only present fields change; temporal strings go through the same
/// normalization as drafts, and an empty string clears the field.
pub fn apply_patch(existing: &Task, patch: &TaskPatch) -> Result<Task> {
    let mut task = existing.clone();

    if let Some(name) = &patch.name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TaskBridgeError::InvalidInput("task name must not be empty".into()));
        }
        task.name = trimmed.to_string();
    }
    if let Some(description) = &patch.description {
        task.description = description.clone();
    }
    if let Some(location) = &patch.location {
        task.location = location.clone();
    }
    if let Some(attendees) = &patch.attendees {
        task.attendees = attendees.clone();
    }
    if let Some(importance) = patch.importance {
        task.importance = importance;
    }
    if let Some(reminder) = patch.reminder {
        task.reminder = reminder;
    }
    if let Some(raw) = &patch.start_time {
        task.start_time = parse_flexible(raw);
    }
    if let Some(raw) = &patch.end_time {
        task.end_time = parse_flexible(raw);
    }
    if let Some(raw) = &patch.due_date {
        task.due_date = parse_flexible(raw);
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }

    if let (Some(start), Some(end)) = (task.start_time, task.end_time) {
        if end < start {
            return Err(TaskBridgeError::InvalidInput(
                "endTime must not precede startTime".into(),
            ));
        }
    }

    task.updated_at = Utc::now();
    Ok(task)
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::{Frequency, RecurrenceRule, ScheduleType};

    use super::*;

    fn draft(name: &str) -> TaskDraft {
        TaskDraft { name: name.to_string(), ..TaskDraft::default() }
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = normalize_draft(draft("   "), "u1");
        assert!(matches!(result, Err(TaskBridgeError::InvalidInput(_))));
    }

    #[test]
    fn times_are_normalized_to_utc_instants() {
        let mut input = draft("meeting");
        input.start_time = Some("2026-03-02T09:00:00+08:00".into());
        input.end_time = Some("2026-03-02 02:00:00".into());

        let task = normalize_draft(input, "u1").expect("valid draft");
        assert_eq!(task.start_time, task.end_time, "+08:00 offset folds into UTC");
    }

    #[test]
    fn unparseable_times_degrade_to_none() {
        let mut input = draft("meeting");
        input.start_time = Some("whenever".into());

        let task = normalize_draft(input, "u1").expect("valid draft");
        assert!(task.start_time.is_none());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let mut input = draft("meeting");
        input.start_time = Some("2026-03-02 10:00:00".into());
        input.end_time = Some("2026-03-02 09:00:00".into());

        let result = normalize_draft(input, "u1");
        assert!(matches!(result, Err(TaskBridgeError::InvalidInput(_))));
    }

    #[test]
    fn schedule_type_is_derived_from_the_rule() {
        let mut input = draft("standup");
        input.recurrence_rule = Some(RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            count: Some(5),
            until: None,
            by_day: None,
        });

        let task = normalize_draft(input, "u1").expect("valid draft");
        assert_eq!(task.schedule_type, ScheduleType::RecurringDaily);
    }

    #[test]
    fn explicit_id_is_honored_for_external_batches() {
        let mut input = draft("CSE101 lecture");
        input.id = Some("timetable-abc123".into());

        let task = normalize_draft(input, "u1").expect("valid draft");
        assert_eq!(task.id, "timetable-abc123");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let base = normalize_draft(draft("original"), "u1").expect("valid draft");
        let patch = TaskPatch {
            description: Some("new details".into()),
            completed: Some(true),
            ..TaskPatch::default()
        };

        let patched = apply_patch(&base, &patch).expect("patch applies");
        assert_eq!(patched.name, "original");
        assert_eq!(patched.description, "new details");
        assert!(patched.completed);
    }

    #[test]
    fn patch_can_clear_a_time_with_an_empty_string() {
        let mut input = draft("meeting");
        input.start_time = Some("2026-03-02 09:00:00".into());
        let base = normalize_draft(input, "u1").expect("valid draft");
        assert!(base.start_time.is_some());

        let patch = TaskPatch { start_time: Some(String::new()), ..TaskPatch::default() };
        let patched = apply_patch(&base, &patch).expect("patch applies");
        assert!(patched.start_time.is_none());
    }
}
