//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ConfigLoader;

pub(crate) fn default_true() -> bool {
    true
}

/// Root directory for jobplane state (`~/.jobplane`).
pub fn jobplane_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".jobplane"))
        .unwrap_or_else(|| PathBuf::from(".jobplane"))
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Job catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// `sqlite` or `memory`.
    #[serde(default = "default_catalog_backend")]
    pub backend: String,

    /// SQLite database path. Supports `~`.
    #[serde(default = "default_catalog_path")]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Database path with `~` expanded.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .map(|p| PathBuf::from(ConfigLoader::expand_path(&p.to_string_lossy())))
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: default_catalog_backend(),
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_backend() -> String {
    "sqlite".to_string()
}

fn default_catalog_path() -> Option<PathBuf> {
    Some(jobplane_dir().join("jobs.db"))
}

/// Scheduling engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the dispatch loop checks for due triggers.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Interval of the background reconciliation sweep; 0 disables it.
    #[serde(default)]
    pub sweep_interval_secs: u64,

    /// How long shutdown waits for in-flight executions.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sweep_interval_secs: 0,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory. Defaults to `~/.jobplane/logs`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Whether to write a rolling log file in addition to the console.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl LoggingConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .as_ref()
            .map(|p| PathBuf::from(ConfigLoader::expand_path(&p.to_string_lossy())))
            .unwrap_or_else(|| jobplane_dir().join("logs"))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            file: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
