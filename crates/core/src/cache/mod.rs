//! Per-user in-memory task cache.
//!
//! A denormalized projection of each user's task set, kept so hot paths
//! (conflict pre-checks during admission, periodic background scans) avoid
//! a full store reload per operation. The store remains the sole arbiter of
//! durable consistency; the cache is allowed to be briefly stale.
//!
//! After the initial full load the only sanctioned mutation is
//! `refresh_incremental`, fed by the `AffectedIds` a store write returned.
//! Refreshes only add, replace, or remove specific ids, never rebuilding
//! the structure, so concurrent readers may interleave with a refresh
//! safely.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use taskbridge_domain::{Result, Task};
use tracing::debug;

use crate::tasks::ports::{AffectedIds, TaskRepository};

/// In-memory mirror of each user's task list.
pub struct UserTaskCache {
    tasks: Arc<dyn TaskRepository>,
    entries: RwLock<HashMap<String, Vec<Task>>>,
}

impl UserTaskCache {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks, entries: RwLock::new(HashMap::new()) }
    }

    /// Populate the full task list for a user. Used at process start and
    /// whenever a user is first materialized.
    pub async fn load(&self, user_id: &str) -> Result<usize> {
        let all = self.tasks.all_tasks(user_id).await?;
        let count = all.len();
        self.entries.write().insert(user_id.to_string(), all);
        debug!(user_id, count, "cache loaded");
        Ok(count)
    }

    /// Apply a write's affected ids: drop deleted ids, re-fetch added and
    /// updated ids from the store, and replace-or-append each one.
    ///
    /// Calling this twice with the same id sets is idempotent. An id that
    /// no longer exists in the store (deleted between write and refresh) is
    /// removed rather than kept stale.
    pub async fn refresh_incremental(&self, user_id: &str, ids: &AffectedIds) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        // Fetch outside the lock; the lock is never held across awaits.
        let mut fetched = Vec::new();
        let mut vanished = Vec::new();
        for id in ids.added.iter().chain(ids.updated.iter()) {
            match self.tasks.find_task(user_id, id).await? {
                Some(task) => fetched.push(task),
                None => vanished.push(id.clone()),
            }
        }

        let mut guard = self.entries.write();
        let list = guard.entry(user_id.to_string()).or_default();

        for id in ids.deleted.iter().chain(vanished.iter()) {
            list.retain(|task| &task.id != id);
        }
        for task in fetched {
            if let Some(slot) = list.iter_mut().find(|cached| cached.id == task.id) {
                *slot = task;
            } else {
                list.push(task);
            }
        }

        Ok(())
    }

    /// Snapshot of a user's cached tasks; empty when the user was never
    /// loaded.
    pub fn snapshot(&self, user_id: &str) -> Vec<Task> {
        self.entries.read().get(user_id).cloned().unwrap_or_default()
    }

    /// Whether a full load has happened for this user.
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.entries.read().contains_key(user_id)
    }

    /// Drop a user's cached view entirely.
    pub fn remove_user(&self, user_id: &str) {
        self.entries.write().remove(user_id);
    }
}
