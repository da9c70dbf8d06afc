//! SQLite implementation of the QueueRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use taskbridge_common::storage::SqlitePool;
use taskbridge_core::tasks::ports::QueueRepository;
use taskbridge_domain::{QueueStatus, Result, ScheduleQueueEntry, TaskBridgeError};
use tracing::instrument;

use super::rows::{queue_entry_from_row, queue_status_to_str};
use crate::errors::to_domain;

const QUEUE_COLUMNS: &str = "id, user_id, raw_request, status, created_at, updated_at";

/// SQLite implementation of [`QueueRepository`].
pub struct SqliteQueueRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteQueueRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn enqueue(&self, entry: &ScheduleQueueEntry) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        conn.execute(
            "INSERT INTO schedule_queue (id, user_id, raw_request, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.user_id,
                entry.raw_request,
                queue_status_to_str(entry.status),
                entry.created_at.timestamp(),
                entry.updated_at.timestamp(),
            ],
        )
        .map_err(to_domain)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ScheduleQueueEntry>> {
        let conn = self.pool.get().map_err(to_domain)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM schedule_queue \
                 WHERE user_id = ?1 ORDER BY created_at DESC"
            ))
            .map_err(to_domain)?;
        let rows = stmt.query_map(params![user_id], queue_entry_from_row).map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<ScheduleQueueEntry>>>().map_err(to_domain)
    }

    async fn find_entry(&self, id: &str) -> Result<Option<ScheduleQueueEntry>> {
        let conn = self.pool.get().map_err(to_domain)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {QUEUE_COLUMNS} FROM schedule_queue WHERE id = ?1"))
            .map_err(to_domain)?;

        match stmt.query_row(params![id], queue_entry_from_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(to_domain(e)),
        }
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: &str, status: QueueStatus) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        let changed = conn
            .execute(
                "UPDATE schedule_queue SET status = ?2, \
                 updated_at = CAST(strftime('%s','now') AS INTEGER) WHERE id = ?1",
                params![id, queue_status_to_str(status)],
            )
            .map_err(to_domain)?;
        if changed == 0 {
            return Err(TaskBridgeError::NotFound(format!("queue entry {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_entry(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(to_domain)?;
        let removed = conn
            .execute("DELETE FROM schedule_queue WHERE id = ?1", params![id])
            .map_err(to_domain)?;
        Ok(removed > 0)
    }
}
