//! The task admission path.
//!
//! Every producer (direct API call, approved queue entry, timetable
//! import, recurrence expansion) goes through this service: validate and
//! normalize the candidate, pre-check conflicts against the cached view,
//! persist (the store re-validates in blocking mode to close races),
//! refresh the cache for exactly the ids the write touched, then notify.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use taskbridge_domain::{
    ChangeEvent, ConflictDetails, LogKind, Result, Task, TaskAction, TaskBridgeError, TaskDraft,
    TaskPatch, TaskSummary, UserLogEntry, UserRecord,
};
use tracing::{error, instrument, warn};

use super::draft::{apply_patch, normalize_draft};
use super::ports::{
    AffectedIds, AuditLogRepository, CalendarGateway, ChangeNotifier, TaskRepository,
    UserRepository,
};
use super::query::TaskQuery;
use crate::cache::UserTaskCache;
use crate::conflict::find_conflicts;
use crate::recurrence::{expand, ExpansionSummary};

/// How detected conflicts affect admission. Threaded explicitly from the
/// outermost call site; nothing below re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Conflicts downgrade to warnings on the success result
    Advisory,
    /// Conflicts abort the operation with a typed error
    Blocking,
}

impl AdmissionMode {
    fn allows_conflicts(self) -> bool {
        matches!(self, AdmissionMode::Advisory)
    }
}

/// Result of a successful admission.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionOutcome {
    pub task: Task,
    /// Conflicts observed at admission time (advisory mode only; blocking
    /// admissions fail instead)
    pub conflicts: Vec<TaskSummary>,
    /// Present when the admitted task was a recurring root
    pub expansion: Option<ExpansionSummary>,
}

/// Orchestrates task mutations for all producers.
pub struct SchedulingService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    logs: Arc<dyn AuditLogRepository>,
    cache: Arc<UserTaskCache>,
    notifier: Arc<dyn ChangeNotifier>,
    calendar: Option<Arc<dyn CalendarGateway>>,
}

impl SchedulingService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        logs: Arc<dyn AuditLogRepository>,
        cache: Arc<UserTaskCache>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self { tasks, users, logs, cache, notifier, calendar: None }
    }

    /// Attach the outbound calendar mirror.
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarGateway>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Borrow the cache this service refreshes.
    pub fn cache(&self) -> &Arc<UserTaskCache> {
        &self.cache
    }

    async fn require_user(&self, user_id: &str) -> Result<UserRecord> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| TaskBridgeError::NotFound(format!("user {user_id}")))
    }

    /// Materialize a user: upsert the record and fully load their cache.
    pub async fn ensure_user(&self, user: &UserRecord) -> Result<()> {
        self.users.upsert_user(user).await?;
        self.cache.load(&user.id).await?;
        Ok(())
    }

    /// Admit a candidate task into the user's schedule.
    ///
    /// When the admitted task is a root with a recurrence rule, its
    /// occurrences are expanded and admitted one at a time in advisory mode;
    /// per-occurrence failures are counted, never propagated.
    #[instrument(skip(self, draft))]
    pub async fn admit(
        &self,
        user_id: &str,
        draft: TaskDraft,
        mode: AdmissionMode,
    ) -> Result<AdmissionOutcome> {
        let user = self.require_user(user_id).await?;
        let task = normalize_draft(draft, user_id)?;

        let conflicts = self.precheck(&user, &task, mode)?;

        let ids = self.tasks.insert_task(&task, user.boundary_policy, mode.allows_conflicts()).await?;
        self.finish_write(
            user_id,
            &ids,
            &task,
            TaskAction::Created,
            LogKind::TaskCreated,
            format!("Task \"{}\" created", task.name),
        )
        .await;

        self.mirror_to_calendar(&task).await;

        let expansion = match &task.recurrence_rule {
            Some(rule) if task.is_root() => Some(self.expand_root(&user, &task, rule).await),
            _ => None,
        };

        Ok(AdmissionOutcome { task, conflicts, expansion })
    }

    /// Replace an existing task wholesale.
    #[instrument(skip(self, draft))]
    pub async fn update(
        &self,
        user_id: &str,
        task_id: &str,
        draft: TaskDraft,
        mode: AdmissionMode,
    ) -> Result<AdmissionOutcome> {
        let user = self.require_user(user_id).await?;
        let existing = self
            .tasks
            .find_task(user_id, task_id)
            .await?
            .ok_or_else(|| TaskBridgeError::NotFound(format!("task {task_id}")))?;

        let mut task = normalize_draft(draft, user_id)?;
        task.id = existing.id.clone();
        task.parent_task_id = existing.parent_task_id.clone();
        task.pushed_to_mstodo = existing.pushed_to_mstodo;
        task.created_at = existing.created_at;

        let conflicts = self.precheck(&user, &task, mode)?;

        let ids = self.tasks.update_task(&task, user.boundary_policy, mode.allows_conflicts()).await?;
        self.finish_write(
            user_id,
            &ids,
            &task,
            TaskAction::Updated,
            LogKind::TaskUpdated,
            format!("Task \"{}\" updated", task.name),
        )
        .await;

        Ok(AdmissionOutcome { task, conflicts, expansion: None })
    }

    /// Apply a partial update. Conflict detection only re-runs when the
    /// patch touches the task's interval.
    #[instrument(skip(self, patch))]
    pub async fn patch(
        &self,
        user_id: &str,
        task_id: &str,
        patch: TaskPatch,
        mode: AdmissionMode,
    ) -> Result<AdmissionOutcome> {
        let user = self.require_user(user_id).await?;
        let existing = self
            .tasks
            .find_task(user_id, task_id)
            .await?
            .ok_or_else(|| TaskBridgeError::NotFound(format!("task {task_id}")))?;

        let task = apply_patch(&existing, &patch)?;

        let conflicts = if patch.touches_times() {
            self.precheck(&user, &task, mode)?
        } else {
            Vec::new()
        };

        // A patch that leaves the interval alone cannot introduce a new
        // overlap, so the store-side re-check is skipped for it.
        let allow_conflict = mode.allows_conflicts() || !patch.touches_times();
        let ids = self.tasks.update_task(&task, user.boundary_policy, allow_conflict).await?;

        let (action, kind, message) = if patch.completed == Some(true) && !existing.completed {
            (
                TaskAction::Completed,
                LogKind::TaskCompleted,
                format!("Task \"{}\" completed", task.name),
            )
        } else {
            (TaskAction::Updated, LogKind::TaskUpdated, format!("Task \"{}\" updated", task.name))
        };
        self.finish_write(user_id, &ids, &task, action, kind, message).await;

        Ok(AdmissionOutcome { task, conflicts, expansion: None })
    }

    /// Mark a task completed.
    pub async fn complete(&self, user_id: &str, task_id: &str) -> Result<AdmissionOutcome> {
        let patch = TaskPatch { completed: Some(true), ..TaskPatch::default() };
        self.patch(user_id, task_id, patch, AdmissionMode::Advisory).await
    }

    /// Delete a task; with `cascade`, a root takes all its occurrences with
    /// it as a unit. Returns whether the named task actually existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, task_id: &str, cascade: bool) -> Result<bool> {
        self.require_user(user_id).await?;
        let existing = self.tasks.find_task(user_id, task_id).await?;

        let occurrences = match &existing {
            Some(task) if cascade && task.is_root() => {
                self.tasks.occurrences_of(user_id, task_id).await?
            }
            _ => Vec::new(),
        };

        let mut ids = self.tasks.delete_task(user_id, task_id).await?;
        let removed = !ids.is_empty();
        for occurrence in &occurrences {
            ids.merge(self.tasks.delete_task(user_id, &occurrence.id).await?);
        }

        if let Some(task) = existing {
            self.finish_write(
                user_id,
                &ids,
                &task,
                TaskAction::Deleted,
                LogKind::TaskDeleted,
                format!("Task \"{}\" deleted", task.name),
            )
            .await;
        } else {
            // Nothing matched; still reconcile the cache in case it is stale
            self.refresh_cache(user_id, &ids).await;
        }

        Ok(removed)
    }

    /// Retract an externally-sourced batch by id pattern. Returns the
    /// number of tasks removed.
    #[instrument(skip(self))]
    pub async fn delete_by_pattern(&self, user_id: &str, id_pattern: &str) -> Result<usize> {
        self.require_user(user_id).await?;
        let ids = self.tasks.delete_tasks_by_pattern(user_id, id_pattern).await?;
        let removed = ids.deleted.len();
        self.refresh_cache(user_id, &ids).await;

        self.audit(
            user_id,
            LogKind::ImportBatch,
            format!("Retracted {removed} task(s) matching \"{id_pattern}\""),
            json!({ "pattern": id_pattern, "removed": removed }),
        )
        .await;

        Ok(removed)
    }

    /// Paginated, filterable listing straight from the store.
    pub async fn list(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>> {
        self.require_user(user_id).await?;
        self.tasks.list_tasks(user_id, query).await
    }

    /// One task by id.
    pub async fn get(&self, user_id: &str, task_id: &str) -> Result<Option<Task>> {
        self.tasks.find_task(user_id, task_id).await
    }

    /// Occurrences generated from a root.
    pub async fn occurrences(&self, user_id: &str, root_id: &str) -> Result<Vec<Task>> {
        self.require_user(user_id).await?;
        self.tasks.occurrences_of(user_id, root_id).await
    }

    /// Advisory conflict pre-check for a hypothetical candidate, served
    /// from the cached view.
    pub async fn check_conflicts(
        &self,
        user_id: &str,
        candidate: &Task,
    ) -> Result<Vec<TaskSummary>> {
        let user = self.require_user(user_id).await?;
        let cached = self.cache.snapshot(user_id);
        Ok(find_conflicts(&cached, candidate, user.boundary_policy)
            .iter()
            .map(Task::summary)
            .collect())
    }

    /// Pre-check against the cache; in blocking mode a non-empty result
    /// aborts here, before anything is written.
    fn precheck(
        &self,
        user: &UserRecord,
        task: &Task,
        mode: AdmissionMode,
    ) -> Result<Vec<TaskSummary>> {
        let cached = self.cache.snapshot(&user.id);
        let conflicts = find_conflicts(&cached, task, user.boundary_policy);
        if conflicts.is_empty() {
            return Ok(Vec::new());
        }

        let summaries: Vec<TaskSummary> = conflicts.iter().map(Task::summary).collect();
        match mode {
            AdmissionMode::Blocking => Err(TaskBridgeError::Conflict(ConflictDetails {
                candidate: task.summary(),
                conflicts: summaries,
            })),
            AdmissionMode::Advisory => {
                warn!(
                    user_id = %user.id,
                    task = %task.name,
                    conflicts = summaries.len(),
                    "admitting task despite schedule conflicts"
                );
                Ok(summaries)
            }
        }
    }

    /// Expand a recurring root and admit each occurrence independently.
    async fn expand_root(
        &self,
        user: &UserRecord,
        root: &Task,
        rule: &taskbridge_domain::RecurrenceRule,
    ) -> ExpansionSummary {
        let mut summary = ExpansionSummary::new(rule.clone());

        for occurrence in expand(root, rule) {
            let cached = self.cache.snapshot(&user.id);
            if !find_conflicts(&cached, &occurrence, user.boundary_policy).is_empty() {
                summary.record_conflict();
            }

            match self.tasks.insert_task(&occurrence, user.boundary_policy, true).await {
                Ok(ids) => {
                    self.finish_write(
                        &user.id,
                        &ids,
                        &occurrence,
                        TaskAction::Created,
                        LogKind::TaskCreated,
                        format!("Occurrence of \"{}\" created", occurrence.name),
                    )
                    .await;
                    summary.record_created();
                }
                Err(err) => {
                    error!(
                        user_id = %user.id,
                        root_id = %root.id,
                        error = %err,
                        "failed to persist occurrence"
                    );
                    summary.record_error();
                }
            }
        }

        summary
    }

    /// Cache refresh + audit + notification after a successful write.
    async fn finish_write(
        &self,
        user_id: &str,
        ids: &AffectedIds,
        task: &Task,
        action: TaskAction,
        kind: LogKind,
        message: String,
    ) {
        self.refresh_cache(user_id, ids).await;
        self.audit(user_id, kind, message, json!({ "task": task.summary() })).await;
        self.notifier.publish(user_id, ChangeEvent::TaskChanged { action, task: task.summary() });
    }

    async fn refresh_cache(&self, user_id: &str, ids: &AffectedIds) {
        if let Err(err) = self.cache.refresh_incremental(user_id, ids).await {
            // The write has committed; a failed refresh only means staleness
            // until the next full load.
            error!(user_id, error = %err, "incremental cache refresh failed");
        }
    }

    async fn audit(
        &self,
        user_id: &str,
        kind: LogKind,
        message: String,
        payload: serde_json::Value,
    ) {
        let entry = UserLogEntry::new(user_id, kind, message, payload);
        match self.logs.append(&entry).await {
            Ok(()) => {
                self.notifier.publish(user_id, ChangeEvent::LogAppended { entry });
            }
            Err(err) => error!(user_id, error = %err, "failed to append audit entry"),
        }
    }

    async fn mirror_to_calendar(&self, task: &Task) {
        let Some(calendar) = &self.calendar else {
            return;
        };
        if let Err(err) = calendar.create_event(task).await {
            // Outbound failures never abort the admission path
            warn!(task_id = %task.id, error = %err, "calendar mirror failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::{BoundaryPolicy, Frequency, RecurrenceRule};

    use super::*;
    use crate::testing::{sample_user, TestPorts};

    fn service(ports: &TestPorts) -> SchedulingService {
        let cache = Arc::new(UserTaskCache::new(ports.tasks.clone() as Arc<dyn TaskRepository>));
        SchedulingService::new(
            ports.tasks.clone(),
            ports.users.clone(),
            ports.logs.clone(),
            cache,
            ports.notifier.clone(),
        )
    }

    async fn service_with_user(ports: &TestPorts, user_id: &str) -> SchedulingService {
        let svc = service(ports);
        svc.ensure_user(&sample_user(user_id)).await.expect("user materializes");
        svc
    }

    fn timed_draft(name: &str, start: &str, end: &str) -> TaskDraft {
        TaskDraft {
            name: name.to_string(),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            ..TaskDraft::default()
        }
    }

    #[tokio::test]
    async fn advisory_admission_reports_conflicts_but_persists() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        svc.admit("u1", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect("first admission");

        let outcome = svc
            .admit("u1", timed_draft("b", "2026-03-02 09:30", "2026-03-02 09:45"), AdmissionMode::Advisory)
            .await
            .expect("advisory admission proceeds despite overlap");

        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(ports.tasks.row_count(), 2, "both tasks persisted");
    }

    #[tokio::test]
    async fn blocking_admission_refuses_overlap_and_writes_nothing() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        svc.admit("u1", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Blocking)
            .await
            .expect("first admission");

        let err = svc
            .admit("u1", timed_draft("b", "2026-03-02 09:30", "2026-03-02 09:45"), AdmissionMode::Blocking)
            .await
            .expect_err("overlap must block");

        assert!(matches!(err, TaskBridgeError::Conflict(_)));
        assert_eq!(ports.tasks.row_count(), 1, "nothing was persisted");
    }

    #[tokio::test]
    async fn store_revalidates_even_when_precheck_misses() {
        // Simulate the race: the cached view is stale (empty) while the
        // store already holds an overlapping row.
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;
        ports.tasks.seed(vec![crate::testing::timed_task(
            "committed",
            "u1",
            "2026-03-02 09:00",
            "2026-03-02 10:00",
        )]);

        let err = svc
            .admit("u1", timed_draft("b", "2026-03-02 09:15", "2026-03-02 09:45"), AdmissionMode::Blocking)
            .await
            .expect_err("store-side re-validation must catch the race");
        assert!(matches!(err, TaskBridgeError::Conflict(_)));
    }

    #[tokio::test]
    async fn admission_refreshes_cache_and_notifies() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        let outcome = svc
            .admit("u1", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect("admission succeeds");

        let cached = svc.cache().snapshot("u1");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, outcome.task.id);

        let events = ports.notifier.events_for("u1");
        assert!(events.iter().any(|event| matches!(
            event,
            ChangeEvent::TaskChanged { action: TaskAction::Created, .. }
        )));
        assert!(events.iter().any(|event| matches!(event, ChangeEvent::LogAppended { .. })));
    }

    #[tokio::test]
    async fn recurring_root_admission_expands_occurrences() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        let mut draft = timed_draft("standup", "2026-03-02 09:00", "2026-03-02 09:15");
        draft.recurrence_rule = Some(RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            count: Some(3),
            until: None,
            by_day: None,
        });

        let outcome =
            svc.admit("u1", draft, AdmissionMode::Advisory).await.expect("admission succeeds");

        let summary = outcome.expansion.expect("root carries a rule");
        assert_eq!(summary.created_count, 2);
        assert_eq!(summary.error_count, 0);
        assert_eq!(ports.tasks.row_count(), 3, "root + 2 occurrences");

        let occurrences =
            svc.occurrences("u1", &outcome.task.id).await.expect("occurrence listing");
        assert_eq!(occurrences.len(), 2);
    }

    #[tokio::test]
    async fn patch_without_times_skips_conflict_check() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        // Two deliberately overlapping tasks, admitted in advisory mode
        let first = svc
            .admit("u1", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect("first");
        svc.admit("u1", timed_draft("b", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect("second");

        // Renaming must succeed even in blocking mode: the interval is untouched
        let patch = TaskPatch { name: Some("renamed".into()), ..TaskPatch::default() };
        let outcome = svc
            .patch("u1", &first.task.id, patch, AdmissionMode::Blocking)
            .await
            .expect("rename ignores existing overlap");
        assert_eq!(outcome.task.name, "renamed");
        assert!(outcome.conflicts.is_empty());
    }

    #[tokio::test]
    async fn patch_missing_task_is_not_found() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        let err = svc
            .patch("u1", "ghost", TaskPatch::default(), AdmissionMode::Advisory)
            .await
            .expect_err("patching a missing task fails");
        assert!(matches!(err, TaskBridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn cascade_delete_removes_root_and_occurrences() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        let mut draft = timed_draft("standup", "2026-03-02 09:00", "2026-03-02 09:15");
        draft.recurrence_rule = Some(RecurrenceRule {
            freq: Frequency::Daily,
            interval: 1,
            count: Some(4),
            until: None,
            by_day: None,
        });
        let outcome =
            svc.admit("u1", draft, AdmissionMode::Advisory).await.expect("admission");
        assert_eq!(ports.tasks.row_count(), 4);

        let removed = svc.delete("u1", &outcome.task.id, true).await.expect("delete");
        assert!(removed);
        assert_eq!(ports.tasks.row_count(), 0);
        assert!(svc.cache().snapshot("u1").is_empty(), "cache follows the cascade");
    }

    #[tokio::test]
    async fn delete_is_idempotent_safe() {
        let ports = TestPorts::default();
        let svc = service_with_user(&ports, "u1").await;

        let removed = svc.delete("u1", "never-existed", false).await.expect("delete");
        assert!(!removed);
    }

    #[tokio::test]
    async fn boundary_policy_is_taken_from_the_user_record() {
        let ports = TestPorts::default();
        let svc = service(&ports);
        let mut user = sample_user("u1");
        user.boundary_policy = BoundaryPolicy::Inclusive;
        svc.ensure_user(&user).await.expect("user materializes");

        svc.admit("u1", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect("first");

        // Touching endpoints conflict only under the inclusive policy
        let err = svc
            .admit("u1", timed_draft("b", "2026-03-02 10:00", "2026-03-02 11:00"), AdmissionMode::Blocking)
            .await
            .expect_err("inclusive policy treats touching endpoints as overlap");
        assert!(matches!(err, TaskBridgeError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected_before_any_write() {
        let ports = TestPorts::default();
        let svc = service(&ports);

        let err = svc
            .admit("ghost", timed_draft("a", "2026-03-02 09:00", "2026-03-02 10:00"), AdmissionMode::Advisory)
            .await
            .expect_err("unknown user");
        assert!(matches!(err, TaskBridgeError::NotFound(_)));
        assert_eq!(ports.tasks.row_count(), 0);
    }
}
