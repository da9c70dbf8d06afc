//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{params, Connection};
use taskbridge_common::storage::{SqlitePool, SqlitePoolConfig};
use taskbridge_domain::{Result, TaskBridgeError};
use tracing::{debug, info};

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 2;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps a [`SqlitePool`].
pub struct DbManager {
    pool: Arc<SqlitePool>,
    path: PathBuf,
}

impl DbManager {
    /// Open the database at `db_path` with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() };
        let pool = SqlitePool::open(&path, config)
            .map_err(|e| TaskBridgeError::Database(e.to_string()))?;

        info!(db_path = %path.display(), pool_size = pool.max_size(), "database opened");
        Ok(Self { pool: Arc::new(pool), path })
    }

    /// In-memory database, for tests.
    pub fn in_memory() -> Result<Self> {
        let pool =
            SqlitePool::open_in_memory().map_err(|e| TaskBridgeError::Database(e.to_string()))?;
        Ok(Self { pool: Arc::new(pool), path: PathBuf::from(":memory:") })
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Ensure the full schema exists, then apply additive column
    /// migrations. Safe to run on every startup: existing tables and
    /// columns are left alone.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.pool.get().map_err(|e| TaskBridgeError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL).map_err(|e| TaskBridgeError::from(InfraError::from(e)))?;
        apply_additive_migrations(&conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(|e| TaskBridgeError::from(InfraError::from(e)))?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify database connectivity with a trivial query.
    pub fn health_check(&self) -> Result<()> {
        self.pool.health_check().map_err(|e| TaskBridgeError::Database(e.to_string()))
    }
}

/// Columns added after the initial schema shipped. Each call is a no-op
/// when the column already exists, so startup never fails on a database
/// that is already current.
fn apply_additive_migrations(conn: &Connection) -> Result<()> {
    add_column_if_missing(conn, "tasks", "pushed_to_mstodo", "pushed_to_mstodo INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(conn, "users", "week_offset", "week_offset INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(conn, "users", "boundary_policy", "boundary_policy TEXT NOT NULL DEFAULT 'exclusive'")?;
    Ok(())
}

fn add_column_if_missing(conn: &Connection, table: &str, column: &str, ddl: &str) -> Result<()> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")
        .and_then(|mut stmt| stmt.exists(params![table, column]))
        .map_err(|e| TaskBridgeError::from(InfraError::from(e)))?;

    if !exists {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {ddl}"), [])
            .map_err(|e| TaskBridgeError::from(InfraError::from(e)))?;
        debug!(table, column, "added missing column");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn migrations_create_schema_version() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("manager created");
        manager.run_migrations().expect("migrations run");

        let conn = manager.pool().get().expect("connection");
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .expect("version readable");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let manager = DbManager::in_memory().expect("manager created");
        manager.run_migrations().expect("first run");
        manager.run_migrations().expect("second run does not fail");
    }

    #[test]
    fn additive_migration_tolerates_existing_column() {
        let manager = DbManager::in_memory().expect("manager created");
        manager.run_migrations().expect("migrations run");

        let conn = manager.pool().get().expect("connection");
        // The column exists from schema.sql; re-applying must be a no-op
        apply_additive_migrations(&conn).expect("re-apply succeeds");
    }

    #[test]
    fn health_check_succeeds_for_valid_database() {
        let manager = DbManager::in_memory().expect("manager created");
        manager.run_migrations().expect("migrations run");
        manager.health_check().expect("health check passes");
    }
}
