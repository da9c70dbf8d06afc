//! Configuration loader.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to probing config
//!    files in a fixed set of locations
//! 3. Supports TOML and JSON formats, picked by extension
//!
//! ## Environment Variables
//! - `TASKBRIDGE_DB_PATH`: database file path (required for env loading)
//! - `TASKBRIDGE_DB_POOL_SIZE`: connection pool size
//! - `TASKBRIDGE_BIND_ADDR`: API server bind address
//! - `TASKBRIDGE_SCAN_INTERVAL_SECS`: occurrence scan interval
//! - `TASKBRIDGE_EXPORT_INTERVAL_SECS`: export push interval
//! - `TASKBRIDGE_SYNC_ENABLED`: enable outbound sync (true/false)
//! - `TASKBRIDGE_TODO_API_BASE`: external task-list base URL
//! - `TASKBRIDGE_CALENDAR_API_BASE`: calendar service base URL
//! - `TASKBRIDGE_TIMETABLE_API_BASE`: timetable portal base URL

use std::path::{Path, PathBuf};

use taskbridge_domain::{Config, Result, TaskBridgeError};
use tracing::{debug, info};

const PROBE_PATHS: &[&str] = &[
    "config.toml",
    "config.json",
    "taskbridge.toml",
    "taskbridge.json",
    "../config.toml",
    "../config.json",
];

/// Load configuration with automatic fallback strategy.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            debug!(error = ?err, "environment configuration incomplete, probing files");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables. `TASKBRIDGE_DB_PATH`
/// must be present; everything else falls back to defaults.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = std::env::var("TASKBRIDGE_DB_PATH").map_err(|_| {
        TaskBridgeError::Config("TASKBRIDGE_DB_PATH is not set".into())
    })?;

    if let Some(pool_size) = env_parse::<u32>("TASKBRIDGE_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }
    if let Ok(bind_addr) = std::env::var("TASKBRIDGE_BIND_ADDR") {
        config.server.bind_addr = bind_addr;
    }
    if let Some(interval) = env_parse::<u64>("TASKBRIDGE_SCAN_INTERVAL_SECS")? {
        config.scheduler.occurrence_scan_interval_secs = interval;
    }
    if let Some(interval) = env_parse::<u64>("TASKBRIDGE_EXPORT_INTERVAL_SECS")? {
        config.scheduler.export_interval_secs = interval;
    }
    if let Some(enabled) = env_parse::<bool>("TASKBRIDGE_SYNC_ENABLED")? {
        config.sync.enabled = enabled;
    }
    if let Ok(base) = std::env::var("TASKBRIDGE_TODO_API_BASE") {
        config.sync.todo_api_base = base;
    }
    if let Ok(base) = std::env::var("TASKBRIDGE_CALENDAR_API_BASE") {
        config.sync.calendar_api_base = base;
    }
    if let Ok(base) = std::env::var("TASKBRIDGE_TIMETABLE_API_BASE") {
        config.sync.timetable_api_base = base;
    }

    Ok(config)
}

/// Load configuration from an explicit file, or probe the default
/// locations when none is given.
pub fn load_from_file(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => probe_config_file().ok_or_else(|| {
            TaskBridgeError::Config(
                "no configuration found in environment or default file locations".into(),
            )
        })?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|err| {
        TaskBridgeError::Config(format!("cannot read {}: {err}", path.display()))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&raw).map_err(|err| {
            TaskBridgeError::Config(format!("invalid TOML in {}: {err}", path.display()))
        })?,
        Some("json") => serde_json::from_str(&raw).map_err(|err| {
            TaskBridgeError::Config(format!("invalid JSON in {}: {err}", path.display()))
        })?,
        other => {
            return Err(TaskBridgeError::Config(format!(
                "unsupported config extension {other:?} for {}",
                path.display()
            )))
        }
    };

    info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

fn probe_config_file() -> Option<PathBuf> {
    PROBE_PATHS.iter().map(PathBuf::from).find(|candidate| candidate.is_file())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            TaskBridgeError::Config(format!("{name} has an unparseable value: {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}
