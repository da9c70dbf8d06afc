//! Application configuration structures.
//!
//! Loading (environment probing, file fallback) lives in the infra layer;
//! these are the plain data shapes it produces.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Durable store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "taskbridge.db".into(), pool_size: 10 }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the API server
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "127.0.0.1:8080".into() }
    }
}

/// Background scheduler intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between occurrence-start scans
    pub occurrence_scan_interval_secs: u64,
    /// Seconds between export push cycles
    pub export_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { occurrence_scan_interval_secs: 60, export_interval_secs: 900 }
    }
}

/// Outbound integration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether outbound sync (calendar mirror, task-list export) is enabled
    pub enabled: bool,
    /// Base URL of the external task-list service
    pub todo_api_base: String,
    /// Base URL of the calendar service
    pub calendar_api_base: String,
    /// Base URL of the timetable portal adapter
    pub timetable_api_base: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            todo_api_base: "http://localhost:9180".into(),
            calendar_api_base: "http://localhost:9181".into(),
            timetable_api_base: "http://localhost:9182".into(),
        }
    }
}
