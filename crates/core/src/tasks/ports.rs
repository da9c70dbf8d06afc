//! Port interfaces for task persistence and fan-out.
//!
//! These traits define the boundaries between core business logic and
//! infrastructure implementations. Every operation is scoped by user id;
//! no port ever crosses users.

use async_trait::async_trait;
use taskbridge_domain::{
    BoundaryPolicy, ChangeEvent, QueueStatus, Result, ScheduleQueueEntry, Task, UserLogEntry,
    UserRecord,
};

use super::query::TaskQuery;

/// The ids a store write touched, handed straight to the cache's
/// incremental refresh. Write methods return this so the
/// "every write is followed by exactly one refresh" invariant is enforced
/// by the call shape instead of by convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedIds {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl AffectedIds {
    pub fn added(id: impl Into<String>) -> Self {
        Self { added: vec![id.into()], ..Self::default() }
    }

    pub fn updated(id: impl Into<String>) -> Self {
        Self { updated: vec![id.into()], ..Self::default() }
    }

    pub fn deleted(ids: Vec<String>) -> Self {
        Self { deleted: ids, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn merge(&mut self, other: AffectedIds) {
        self.added.extend(other.added);
        self.updated.extend(other.updated);
        self.deleted.extend(other.deleted);
    }
}

/// Durable task persistence.
///
/// When `allow_conflict` is false the implementation re-runs conflict
/// detection against the user's current rows inside the write path, so two
/// near-simultaneous blocking admissions cannot both land.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds>;

    async fn update_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds>;

    async fn find_task(&self, user_id: &str, id: &str) -> Result<Option<Task>>;

    /// Every task belonging to the user, unfiltered. Used for cache loads.
    async fn all_tasks(&self, user_id: &str) -> Result<Vec<Task>>;

    async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>>;

    /// Occurrences generated from the given root.
    async fn occurrences_of(&self, user_id: &str, root_id: &str) -> Result<Vec<Task>>;

    /// Single delete; the result is empty when no row matched.
    async fn delete_task(&self, user_id: &str, id: &str) -> Result<AffectedIds>;

    /// Bulk delete of every task whose id matches the `LIKE` pattern, used
    /// to retract an externally-sourced batch in one operation.
    async fn delete_tasks_by_pattern(&self, user_id: &str, id_pattern: &str)
        -> Result<AffectedIds>;

    /// Completed tasks not yet pushed to the external task list.
    async fn pending_export(&self, limit: usize) -> Result<Vec<Task>>;

    /// Latch `pushed_to_mstodo` after a successful external push.
    async fn mark_pushed(&self, user_id: &str, id: &str) -> Result<()>;
}

/// User persistence and per-user settings.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn upsert_user(&self, user: &UserRecord) -> Result<()>;
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>>;
    async fn list_users(&self) -> Result<Vec<UserRecord>>;
    async fn set_boundary_policy(&self, id: &str, policy: BoundaryPolicy) -> Result<()>;
    async fn set_week_offset(&self, id: &str, offset: i32) -> Result<()>;
}

/// The schedule queue backing the approval gate.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn enqueue(&self, entry: &ScheduleQueueEntry) -> Result<()>;
    /// A user's entries, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ScheduleQueueEntry>>;
    async fn find_entry(&self, id: &str) -> Result<Option<ScheduleQueueEntry>>;
    async fn update_status(&self, id: &str, status: QueueStatus) -> Result<()>;
    async fn delete_entry(&self, id: &str) -> Result<bool>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &UserLogEntry) -> Result<()>;
    /// A user's entries, newest first.
    async fn list_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<UserLogEntry>>;
}

/// Best-effort push fan-out to connected viewers of one user.
///
/// Delivery failures are swallowed by the implementation; publishing never
/// affects the outcome of the operation that triggered it.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, user_id: &str, event: ChangeEvent);
}

/// Outbound mirror of admitted tasks into the user's calendar.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn create_event(&self, task: &Task) -> Result<()>;
}

/// One-shot projection push to the external task list.
#[async_trait]
pub trait TaskExportGateway: Send + Sync {
    async fn push_task(&self, task: &Task) -> Result<()>;
}
