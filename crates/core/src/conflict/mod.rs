//! Interval conflict detection.
//!
//! Pure functions over task intervals. Detection is advisory by default
//! (most call sites log the result and proceed), but `assert_no_conflict`
//! turns the same check into a hard admission gate for call sites that opt
//! into blocking semantics.
//!
//! Malformed input never raises: tasks with missing endpoints drop out of
//! consideration, and a candidate whose interval is empty or inverted
//! produces zero conflicts.

use taskbridge_domain::{BoundaryPolicy, ConflictDetails, Result, Task, TaskBridgeError};

/// Every existing task whose interval overlaps the candidate under the
/// given boundary policy. The candidate itself is excluded by id; order of
/// the result is not significant.
pub fn find_conflicts(existing: &[Task], candidate: &Task, policy: BoundaryPolicy) -> Vec<Task> {
    let Some((candidate_start, candidate_end)) = candidate.interval() else {
        return Vec::new();
    };
    if candidate_end <= candidate_start {
        return Vec::new();
    }

    existing
        .iter()
        .filter(|task| task.id != candidate.id)
        .filter(|task| {
            let Some((start, end)) = task.interval() else {
                return false;
            };
            match policy {
                BoundaryPolicy::Exclusive => candidate_start < end && candidate_end > start,
                BoundaryPolicy::Inclusive => candidate_start <= end && candidate_end >= start,
            }
        })
        .cloned()
        .collect()
}

/// Hard admission gate: raises the typed conflict error, carrying the
/// candidate and every overlapping task, when `find_conflicts` is non-empty.
pub fn assert_no_conflict(
    existing: &[Task],
    candidate: &Task,
    policy: BoundaryPolicy,
) -> Result<()> {
    let conflicts = find_conflicts(existing, candidate, policy);
    if conflicts.is_empty() {
        return Ok(());
    }
    Err(TaskBridgeError::Conflict(ConflictDetails {
        candidate: candidate.summary(),
        conflicts: conflicts.iter().map(Task::summary).collect(),
    }))
}
