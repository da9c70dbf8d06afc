//! In-memory port implementations for tests.
//!
//! These honor the same contracts as the SQLite repositories, including
//! write-time conflict re-validation in blocking mode, so service-level
//! behavior can be exercised without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use parking_lot::{Mutex, RwLock};
use taskbridge_domain::{
    BoundaryPolicy, ChangeEvent, Importance, QueueStatus, Result, ScheduleQueueEntry,
    ScheduleType, Task, TaskBridgeError, UserLogEntry, UserRecord,
};

use crate::conflict::assert_no_conflict;
use crate::tasks::ports::{
    AffectedIds, AuditLogRepository, ChangeNotifier, QueueRepository, TaskRepository,
    UserRepository,
};
use crate::tasks::query::{SortField, SortOrder, TaskQuery};

/// A task with no interval, owned by `user_id`.
pub fn sample_task(id: &str, user_id: &str) -> Task {
    let now = Utc::now();
    Task {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: format!("task {id}"),
        description: String::new(),
        location: String::new(),
        attendees: Vec::new(),
        importance: Importance::Normal,
        reminder: false,
        start_time: None,
        end_time: None,
        due_date: None,
        schedule_type: ScheduleType::Single,
        recurrence_rule: None,
        parent_task_id: None,
        completed: false,
        pushed_to_mstodo: false,
        created_at: now,
        updated_at: now,
    }
}

/// A task spanning `[start, end]`, both given as `%Y-%m-%d %H:%M`.
pub fn timed_task(id: &str, user_id: &str, start: &str, end: &str) -> Task {
    let parse = |s: &str| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .expect("test datetime parses")
            .and_utc()
    };
    let mut task = sample_task(id, user_id);
    task.start_time = Some(parse(start));
    task.end_time = Some(parse(end));
    task
}

/// A user record with default settings.
pub fn sample_user(id: &str) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: id.to_string(),
        display_name: format!("user {id}"),
        boundary_policy: BoundaryPolicy::default(),
        week_offset: 0,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory [`TaskRepository`].
#[derive(Default)]
pub struct InMemoryTaskRepository {
    rows: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    /// Upsert rows directly, bypassing admission.
    pub fn seed(&self, tasks: Vec<Task>) {
        let mut rows = self.rows.write();
        for task in tasks {
            if let Some(slot) = rows.iter_mut().find(|row| row.id == task.id) {
                *slot = task;
            } else {
                rows.push(task);
            }
        }
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds> {
        let mut rows = self.rows.write();
        if rows.iter().any(|row| row.id == task.id) {
            return Err(TaskBridgeError::Database(format!("duplicate task id {}", task.id)));
        }
        if !allow_conflict {
            let user_rows: Vec<Task> =
                rows.iter().filter(|row| row.user_id == task.user_id).cloned().collect();
            assert_no_conflict(&user_rows, task, policy)?;
        }
        rows.push(task.clone());
        Ok(AffectedIds::added(task.id.clone()))
    }

    async fn update_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds> {
        let mut rows = self.rows.write();
        if !allow_conflict {
            let user_rows: Vec<Task> = rows
                .iter()
                .filter(|row| row.user_id == task.user_id && row.id != task.id)
                .cloned()
                .collect();
            assert_no_conflict(&user_rows, task, policy)?;
        }
        let slot = rows
            .iter_mut()
            .find(|row| row.id == task.id && row.user_id == task.user_id)
            .ok_or_else(|| TaskBridgeError::NotFound(format!("task {}", task.id)))?;
        *slot = task.clone();
        Ok(AffectedIds::updated(task.id.clone()))
    }

    async fn find_task(&self, user_id: &str, id: &str) -> Result<Option<Task>> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|row| row.user_id == user_id && row.id == id)
            .cloned())
    }

    async fn all_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self.rows.read().iter().filter(|row| row.user_id == user_id).cloned().collect())
    }

    async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>> {
        let mut matches: Vec<Task> = self
            .rows
            .read()
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter(|row| match (query.window_start, query.window_end) {
                (Some(start), Some(end)) => {
                    row.end_time.is_some_and(|t| t >= start)
                        && row.start_time.is_some_and(|t| t <= end)
                }
                _ => true,
            })
            .filter(|row| {
                query.completed.map_or(true, |wanted| row.completed == wanted)
            })
            .filter(|row| {
                query.text.as_deref().map_or(true, |needle| {
                    row.name.contains(needle)
                        || row.description.contains(needle)
                        || row.location.contains(needle)
                })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match query.sort_by {
                SortField::StartTime => a.start_time.cmp(&b.start_time),
                SortField::EndTime => a.end_time.cmp(&b.end_time),
                SortField::DueDate => a.due_date.cmp(&b.due_date),
                SortField::Name => a.name.cmp(&b.name),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(matches
            .into_iter()
            .skip(query.offset as usize)
            .take(query.effective_limit() as usize)
            .collect())
    }

    async fn occurrences_of(&self, user_id: &str, root_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| {
                row.user_id == user_id && row.parent_task_id.as_deref() == Some(root_id)
            })
            .cloned()
            .collect())
    }

    async fn delete_task(&self, user_id: &str, id: &str) -> Result<AffectedIds> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !(row.user_id == user_id && row.id == id));
        if rows.len() < before {
            Ok(AffectedIds::deleted(vec![id.to_string()]))
        } else {
            Ok(AffectedIds::default())
        }
    }

    async fn delete_tasks_by_pattern(
        &self,
        user_id: &str,
        id_pattern: &str,
    ) -> Result<AffectedIds> {
        let prefix = id_pattern.strip_suffix('%').unwrap_or(id_pattern);
        let mut rows = self.rows.write();
        let (doomed, kept): (Vec<Task>, Vec<Task>) = rows
            .drain(..)
            .partition(|row| row.user_id == user_id && row.id.starts_with(prefix));
        *rows = kept;
        Ok(AffectedIds::deleted(doomed.into_iter().map(|row| row.id).collect()))
    }

    async fn pending_export(&self, limit: usize) -> Result<Vec<Task>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| row.completed && !row.pushed_to_mstodo)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_pushed(&self, user_id: &str, id: &str) -> Result<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.id == id)
            .ok_or_else(|| TaskBridgeError::NotFound(format!("task {id}")))?;
        slot.pushed_to_mstodo = true;
        Ok(())
    }
}

/// In-memory [`UserRepository`].
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn seed(&self, users: Vec<UserRecord>) {
        let mut rows = self.rows.write();
        for user in users {
            rows.insert(user.id.clone(), user);
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.rows.write().insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    async fn set_boundary_policy(&self, id: &str, policy: BoundaryPolicy) -> Result<()> {
        let mut rows = self.rows.write();
        let user = rows
            .get_mut(id)
            .ok_or_else(|| TaskBridgeError::NotFound(format!("user {id}")))?;
        user.boundary_policy = policy;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_week_offset(&self, id: &str, offset: i32) -> Result<()> {
        let mut rows = self.rows.write();
        let user = rows
            .get_mut(id)
            .ok_or_else(|| TaskBridgeError::NotFound(format!("user {id}")))?;
        user.week_offset = offset;
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory [`QueueRepository`].
#[derive(Default)]
pub struct InMemoryQueueRepository {
    rows: RwLock<Vec<ScheduleQueueEntry>>,
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn enqueue(&self, entry: &ScheduleQueueEntry) -> Result<()> {
        self.rows.write().push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ScheduleQueueEntry>> {
        let mut entries: Vec<ScheduleQueueEntry> = self
            .rows
            .read()
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn find_entry(&self, id: &str) -> Result<Option<ScheduleQueueEntry>> {
        Ok(self.rows.read().iter().find(|entry| entry.id == id).cloned())
    }

    async fn update_status(&self, id: &str, status: QueueStatus) -> Result<()> {
        let mut rows = self.rows.write();
        let entry = rows
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| TaskBridgeError::NotFound(format!("queue entry {id}")))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_entry(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|entry| entry.id != id);
        Ok(rows.len() < before)
    }
}

/// In-memory [`AuditLogRepository`].
#[derive(Default)]
pub struct InMemoryAuditLog {
    rows: RwLock<Vec<UserLogEntry>>,
}

impl InMemoryAuditLog {
    pub fn entries(&self) -> Vec<UserLogEntry> {
        self.rows.read().clone()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLog {
    async fn append(&self, entry: &UserLogEntry) -> Result<()> {
        self.rows.write().push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<UserLogEntry>> {
        let mut entries: Vec<UserLogEntry> = self
            .rows
            .read()
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.time.cmp(&a.time));
        entries.truncate(limit as usize);
        Ok(entries)
    }
}

/// Notifier that records every published event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, ChangeEvent)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(String, ChangeEvent)> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, user_id: &str) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, user_id: &str, event: ChangeEvent) {
        self.events.lock().push((user_id.to_string(), event));
    }
}

/// Convenience bundle wiring the in-memory ports together.
pub struct TestPorts {
    pub tasks: Arc<InMemoryTaskRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub queue: Arc<InMemoryQueueRepository>,
    pub logs: Arc<InMemoryAuditLog>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
            queue: Arc::new(InMemoryQueueRepository::default()),
            logs: Arc::new(InMemoryAuditLog::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }
}
