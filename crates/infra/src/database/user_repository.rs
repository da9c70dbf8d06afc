//! SQLite implementation of the UserRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use taskbridge_common::storage::SqlitePool;
use taskbridge_core::tasks::ports::UserRepository;
use taskbridge_domain::{BoundaryPolicy, Result, TaskBridgeError, UserRecord};
use tracing::instrument;

use super::rows::{boundary_policy_to_str, user_from_row};
use crate::errors::to_domain;

const USER_COLUMNS: &str = "id, display_name, boundary_policy, week_offset, created_at, updated_at";

/// SQLite implementation of [`UserRepository`].
pub struct SqliteUserRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteUserRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        conn.execute(
            "INSERT INTO users (id, display_name, boundary_policy, week_offset, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                 display_name = excluded.display_name, \
                 boundary_policy = excluded.boundary_policy, \
                 week_offset = excluded.week_offset, \
                 updated_at = excluded.updated_at",
            params![
                user.id,
                user.display_name,
                boundary_policy_to_str(user.boundary_policy),
                user.week_offset,
                user.created_at.timestamp(),
                user.updated_at.timestamp(),
            ],
        )
        .map_err(to_domain)?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let conn = self.pool.get().map_err(to_domain)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .map_err(to_domain)?;

        match stmt.query_row(params![id], user_from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(to_domain(e)),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let conn = self.pool.get().map_err(to_domain)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .map_err(to_domain)?;
        let rows = stmt.query_map([], user_from_row).map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<UserRecord>>>().map_err(to_domain)
    }

    #[instrument(skip(self))]
    async fn set_boundary_policy(&self, id: &str, policy: BoundaryPolicy) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        let changed = conn
            .execute(
                "UPDATE users SET boundary_policy = ?2, \
                 updated_at = CAST(strftime('%s','now') AS INTEGER) WHERE id = ?1",
                params![id, boundary_policy_to_str(policy)],
            )
            .map_err(to_domain)?;
        if changed == 0 {
            return Err(TaskBridgeError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_week_offset(&self, id: &str, offset: i32) -> Result<()> {
        let conn = self.pool.get().map_err(to_domain)?;
        let changed = conn
            .execute(
                "UPDATE users SET week_offset = ?2, \
                 updated_at = CAST(strftime('%s','now') AS INTEGER) WHERE id = ?1",
                params![id, offset],
            )
            .map_err(to_domain)?;
        if changed == 0 {
            return Err(TaskBridgeError::NotFound(format!("user {id}")));
        }
        Ok(())
    }
}
