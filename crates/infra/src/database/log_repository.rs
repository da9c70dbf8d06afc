//! SQLite implementation of the AuditLogRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use taskbridge_common::storage::SqlitePool;
use taskbridge_core::tasks::ports::AuditLogRepository;
use taskbridge_domain::{Result, UserLogEntry};
use tracing::instrument;

use super::rows::{log_entry_from_row, log_kind_to_str};
use crate::errors::to_domain;

const LOG_COLUMNS: &str = "id, user_id, time, type, message, payload";

/// SQLite implementation of [`AuditLogRepository`].
pub struct SqliteAuditLogRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteAuditLogRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id))]
    async fn append(&self, entry: &UserLogEntry) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        let payload = serde_json::to_string(&entry.payload).map_err(to_domain)?;
        conn.execute(
            "INSERT INTO user_logs (id, user_id, time, type, message, payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.user_id,
                entry.time.timestamp(),
                log_kind_to_str(entry.kind),
                entry.message,
                payload,
            ],
        )
        .map_err(to_domain)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<UserLogEntry>> {
        let conn = self.pool.get().map_err(to_domain)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {LOG_COLUMNS} FROM user_logs \
                 WHERE user_id = ?1 ORDER BY time DESC, id DESC LIMIT ?2"
            ))
            .map_err(to_domain)?;
        let rows =
            stmt.query_map(params![user_id, limit], log_entry_from_row).map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<UserLogEntry>>>().map_err(to_domain)
    }
}
