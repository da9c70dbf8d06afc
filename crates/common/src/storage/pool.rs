//! r2d2-based SQLite connection pool.
//!
//! Each connection handed out by the pool has WAL mode, foreign keys, and a
//! busy timeout applied before first use.

use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info};

use super::error::{StorageError, StorageResult};

/// Pooled SQLite connection handle.
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long `get` waits for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite lock contention
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

/// SQLite connection pool.
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Open (or create) the database at `path` and build the pool.
    pub fn open<P: AsRef<Path>>(path: P, config: SqlitePoolConfig) -> StorageResult<Self> {
        if config.max_size == 0 {
            return Err(StorageError::InvalidConfig("pool size must be at least 1".into()));
        }

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)?;

        info!(
            db_path = %path.as_ref().display(),
            max_connections = config.max_size,
            "sqlite pool initialised"
        );

        Ok(Self { pool, config })
    }

    /// In-memory pool with a single shared connection, for tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        let config = SqlitePoolConfig {
            max_size: 1,
            // WAL is meaningless for :memory: databases
            enable_wal: false,
            ..SqlitePoolConfig::default()
        };
        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::memory().with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)?;
            Ok(())
        });
        let pool = Pool::builder().max_size(config.max_size).build(manager)?;
        Ok(Self { pool, config })
    }

    /// Acquire a connection from the pool.
    pub fn get(&self) -> StorageResult<SqliteConnection> {
        self.pool.get().map_err(|_| StorageError::PoolExhausted)
    }

    /// Verify the database is reachable and responsive.
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        debug!("sqlite health check passed");
        Ok(())
    }

    /// Maximum pool size as configured.
    pub fn max_size(&self) -> u32 {
        self.config.max_size
    }
}

/// Apply per-connection pragmas.
fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlitePoolConfig,
) -> Result<(), rusqlite::Error> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    if config.enable_foreign_keys {
        pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    }

    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)?;

    Ok(())
}
