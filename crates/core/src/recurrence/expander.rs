//! Rule-to-occurrence expansion.

use chrono::{DateTime, Datelike, Duration, Utc};
use taskbridge_domain::constants::RECURRENCE_SAFETY_CEILING;
use taskbridge_domain::{Frequency, RecurrenceRule, RuleDay, ScheduleType, Task};
use tracing::warn;
use uuid::Uuid;

/// Expand a root task into its concrete child occurrences.
///
/// The root itself is never part of the output but counts as the first
/// instance for `count` purposes. A root with missing or inverted times
/// expands to nothing. `weeklyByWeekNumber` and `dailyOnDays` are declared
/// frequencies without an expansion and yield an empty list.
pub fn expand(root: &Task, rule: &RecurrenceRule) -> Vec<Task> {
    let Some((root_start, root_end)) = root.interval() else {
        return Vec::new();
    };
    if root_end < root_start {
        return Vec::new();
    }

    let interval = i64::from(rule.interval.max(1));
    match rule.freq {
        Frequency::Daily => expand_stepped(root, rule, root_start, root_end, Duration::days(interval)),
        Frequency::Weekly => match rule.by_day.as_deref() {
            Some(days) if !days.is_empty() => {
                expand_weekly_by_day(root, rule, root_start, root_end, days)
            }
            _ => expand_stepped(root, rule, root_start, root_end, Duration::weeks(interval)),
        },
        Frequency::WeeklyByWeekNumber | Frequency::DailyOnDays => {
            warn!(
                root_id = %root.id,
                freq = ?rule.freq,
                "recurrence frequency has no expansion; generating no occurrences"
            );
            Vec::new()
        }
    }
}

/// Whether one more occurrence may be generated given what has been
/// generated so far and the start of the next candidate.
fn may_generate(rule: &RecurrenceRule, generated: usize, next_start: DateTime<Utc>) -> bool {
    if let Some(count) = rule.count {
        // The root counts as the first instance
        if generated as u32 + 1 >= count {
            return false;
        }
    }
    if let Some(until) = rule.until {
        if next_start > until {
            return false;
        }
    }
    if rule.count.is_none() && rule.until.is_none() && generated >= RECURRENCE_SAFETY_CEILING {
        return false;
    }
    true
}

/// Fixed-step expansion: each occurrence shifts cumulatively from the
/// previous one, not from the root each time.
fn expand_stepped(
    root: &Task,
    rule: &RecurrenceRule,
    root_start: DateTime<Utc>,
    root_end: DateTime<Utc>,
    step: Duration,
) -> Vec<Task> {
    let mut occurrences = Vec::new();
    let mut start = root_start;
    let mut end = root_end;

    loop {
        start += step;
        end += step;
        if !may_generate(rule, occurrences.len(), start) {
            break;
        }
        occurrences.push(occurrence_from(root, start, end));
    }

    occurrences
}

/// Weekly expansion restricted to specific weekdays.
///
/// For each week offset the candidate date of every requested weekday is
/// computed by offsetting from the root's own weekday; the candidate that
/// coincides exactly with the root's start is skipped (the root already
/// covers it). Stop conditions are checked per candidate within a week.
fn expand_weekly_by_day(
    root: &Task,
    rule: &RecurrenceRule,
    root_start: DateTime<Utc>,
    root_end: DateTime<Utc>,
    by_day: &[RuleDay],
) -> Vec<Task> {
    let root_dow = i64::from(root_start.weekday().num_days_from_monday());
    let mut day_offsets: Vec<i64> = by_day
        .iter()
        .map(|day| (i64::from(day.days_from_monday()) - root_dow).rem_euclid(7))
        .collect();
    day_offsets.sort_unstable();
    day_offsets.dedup();

    let step_weeks = i64::from(rule.interval.max(1));
    let mut occurrences = Vec::new();

    'weeks: for week in 0i64.. {
        for &day_offset in &day_offsets {
            let shift = Duration::days(day_offset) + Duration::weeks(week * step_weeks);
            let start = root_start + shift;
            if start == root_start {
                continue;
            }
            if !may_generate(rule, occurrences.len(), start) {
                break 'weeks;
            }
            occurrences.push(occurrence_from(root, start, root_end + shift));
        }
    }

    occurrences
}

fn occurrence_from(root: &Task, start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4().to_string(),
        user_id: root.user_id.clone(),
        name: root.name.clone(),
        description: root.description.clone(),
        location: root.location.clone(),
        attendees: root.attendees.clone(),
        importance: root.importance,
        reminder: root.reminder,
        start_time: Some(start),
        end_time: Some(end),
        // Each occurrence's due date mirrors its own end
        due_date: Some(end),
        schedule_type: ScheduleType::Single,
        recurrence_rule: None,
        parent_task_id: Some(root.id.clone()),
        completed: false,
        pushed_to_mstodo: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{NaiveDateTime, Weekday};
    use taskbridge_domain::Importance;

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .expect("test datetime parses")
            .and_utc()
    }

    fn root_task(start: &str, end: &str) -> Task {
        let now = Utc::now();
        Task {
            id: "root-1".to_string(),
            user_id: "u1".to_string(),
            name: "lecture".to_string(),
            description: "weekly lecture".to_string(),
            location: "SC176".to_string(),
            attendees: vec!["me@example.edu".to_string()],
            importance: Importance::Normal,
            reminder: true,
            start_time: Some(at(start)),
            end_time: Some(at(end)),
            due_date: Some(at(end)),
            schedule_type: ScheduleType::RecurringDaily,
            recurrence_rule: None,
            parent_task_id: None,
            completed: false,
            pushed_to_mstodo: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn rule(freq: Frequency) -> RecurrenceRule {
        RecurrenceRule { freq, interval: 1, count: None, until: None, by_day: None }
    }

    #[test]
    fn daily_count_generates_count_minus_one_occurrences() {
        // 2026-03-02 is a Monday
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let daily = RecurrenceRule { count: Some(3), ..rule(Frequency::Daily) };

        let occurrences = expand(&root, &daily);
        assert_eq!(occurrences.len(), 2, "root + 2 generated = 3 total");

        assert_eq!(occurrences[0].start_time, Some(at("2026-03-03 09:00")));
        assert_eq!(occurrences[0].end_time, Some(at("2026-03-03 10:00")));
        assert_eq!(occurrences[1].start_time, Some(at("2026-03-04 09:00")));
        assert_eq!(occurrences[1].end_time, Some(at("2026-03-04 10:00")));
    }

    #[test]
    fn unbounded_daily_stops_at_the_safety_ceiling() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let occurrences = expand(&root, &rule(Frequency::Daily));
        assert_eq!(occurrences.len(), RECURRENCE_SAFETY_CEILING);
    }

    #[test]
    fn daily_until_cuts_off_generation() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let daily =
            RecurrenceRule { until: Some(at("2026-03-05 23:59")), ..rule(Frequency::Daily) };

        let occurrences = expand(&root, &daily);
        // Generated starts: 03-03, 03-04, 03-05; 03-06 exceeds until
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn daily_interval_steps_cumulatively() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let every_other =
            RecurrenceRule { interval: 2, count: Some(3), ..rule(Frequency::Daily) };

        let occurrences = expand(&root, &every_other);
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].start_time, Some(at("2026-03-04 09:00")));
        assert_eq!(occurrences[1].start_time, Some(at("2026-03-06 09:00")));
    }

    #[test]
    fn weekly_without_by_day_steps_whole_weeks() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let weekly = RecurrenceRule { count: Some(3), ..rule(Frequency::Weekly) };

        let occurrences = expand(&root, &weekly);
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].start_time, Some(at("2026-03-09 09:00")));
        assert_eq!(occurrences[1].start_time, Some(at("2026-03-16 09:00")));
    }

    #[test]
    fn weekly_by_day_lands_only_on_requested_weekdays() {
        // 2026-03-04 is a Wednesday
        let root = root_task("2026-03-04 09:00", "2026-03-04 10:00");
        let by_day = RecurrenceRule {
            by_day: Some(vec![RuleDay::Mon, RuleDay::Wed, RuleDay::Fri]),
            count: Some(8),
            ..rule(Frequency::Weekly)
        };

        let occurrences = expand(&root, &by_day);
        assert_eq!(occurrences.len(), 7, "root + 7 generated = 8 total");

        let allowed: HashSet<Weekday> = [Weekday::Mon, Weekday::Wed, Weekday::Fri].into();
        for occurrence in &occurrences {
            let start = occurrence.start_time.expect("generated start present");
            assert!(allowed.contains(&start.weekday()), "unexpected weekday: {start}");
            assert_eq!(occurrence.parent_task_id.as_deref(), Some("root-1"));
        }

        // The root's own instant must not be duplicated
        assert!(occurrences.iter().all(|o| o.start_time != root.start_time));
    }

    #[test]
    fn generated_occurrences_inherit_descriptive_fields() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        let daily = RecurrenceRule { count: Some(2), ..rule(Frequency::Daily) };

        let occurrences = expand(&root, &daily);
        assert_eq!(occurrences.len(), 1);
        let occurrence = &occurrences[0];

        assert_ne!(occurrence.id, root.id, "occurrences get fresh ids");
        assert_eq!(occurrence.name, root.name);
        assert_eq!(occurrence.location, root.location);
        assert_eq!(occurrence.attendees, root.attendees);
        assert!(!occurrence.completed);
        assert!(occurrence.recurrence_rule.is_none());
        assert_eq!(occurrence.schedule_type, ScheduleType::Single);
        assert_eq!(occurrence.due_date, occurrence.end_time);
    }

    #[test]
    fn declared_but_unexpanded_frequencies_yield_nothing() {
        let root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        assert!(expand(&root, &rule(Frequency::WeeklyByWeekNumber)).is_empty());
        assert!(expand(&root, &rule(Frequency::DailyOnDays)).is_empty());
    }

    #[test]
    fn root_with_missing_times_expands_to_nothing() {
        let mut root = root_task("2026-03-02 09:00", "2026-03-02 10:00");
        root.start_time = None;
        assert!(expand(&root, &rule(Frequency::Daily)).is_empty());
    }
}
