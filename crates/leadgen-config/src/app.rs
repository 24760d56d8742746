// crates/leadgen-config/src/app.rs
// ============================================================================
// Module: Application Configuration
// Description: Process-level settings loaded from TOML with env overrides.
// Purpose: Fail closed on missing or invalid configuration before any
// subsystem starts.
// Dependencies: serde, std::{env, fs}, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file resolved by
//! [`AppConfig::resolve_path`] (an explicit path, then `LEADGEN_CONFIG`, then
//! the default filename), then validated. Individual fields can be
//! overridden by environment variables so a container can tweak bind
//! addresses without rewriting the file.

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "leadgen.toml";
/// Environment variable used to override the config path.
const CONFIG_ENV_VAR: &str = "LEADGEN_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file exceeded [`MAX_CONFIG_FILE_SIZE`] or failed decoding.
    #[error("config invalid: {0}")]
    Invalid(String),
    /// The config file could not be parsed as TOML.
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Campaign and event store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Versioned config store configuration.
    #[serde(default)]
    pub config_store: StoreConfig,
    /// Worker pool configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Loads configuration from `path`, or from the environment/default
    /// location when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the
    /// size limit, fails to parse, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = Self::resolve_path(path);
        let metadata = fs::metadata(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = fs::read_to_string(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        let mut config: Self = toml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Resolves the config file path: explicit argument, then
    /// `LEADGEN_CONFIG`, then [`DEFAULT_CONFIG_NAME`] in the working
    /// directory.
    fn resolve_path(path: Option<&Path>) -> PathBuf {
        if let Some(path) = path {
            return path.to_path_buf();
        }
        if let Ok(value) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(value);
        }
        PathBuf::from(DEFAULT_CONFIG_NAME)
    }

    /// Applies environment overrides that take precedence over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = env::var("LEADGEN_BIND") {
            self.server.bind = bind;
        }
        if let Ok(path) = env::var("LEADGEN_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }
    }

    /// Validates internal consistency of the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any section fails validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.worker.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP/SSE server.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must be set".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// `SQLite`-backed store configuration shared by the campaign store and the
/// versioned config store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds before a locked database call fails.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("leadgen.sqlite3")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker loop tasks to run.
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    /// Batch size each worker claims and processes per job.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Poll interval, in milliseconds, when no job is available to claim.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Heartbeat interval, in milliseconds, for in-progress jobs.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Duration after which a job with no heartbeat is reaped.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Maximum attempts before a job is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff, in milliseconds, for exponential retry scheduling.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Maximum CAS retries against the versioned config store.
    #[serde(default = "default_cas_max_retries")]
    pub config_cas_max_retries: u32,
    /// Lease TTL, in milliseconds, for versioned config store leases.
    #[serde(default = "default_lease_ttl_ms")]
    pub config_lease_ttl_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            stale_after_ms: default_stale_after_ms(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            config_cas_max_retries: default_cas_max_retries(),
            config_lease_ttl_ms: default_lease_ttl_ms(),
        }
    }
}

impl WorkerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("worker.worker_count must be greater than zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("worker.batch_size must be greater than zero".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("worker.max_attempts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

const fn default_worker_count() -> u32 {
    4
}

const fn default_batch_size() -> usize {
    100
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_heartbeat_interval_ms() -> u64 {
    2_000
}

const fn default_stale_after_ms() -> u64 {
    30_000
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_base_backoff_ms() -> u64 {
    1_000
}

const fn default_cas_max_retries() -> u32 {
    8
}

const fn default_lease_ttl_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            config_store: StoreConfig::default(),
            worker: WorkerConfig::default(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_bind_is_rejected() {
        let server = ServerConfig {
            bind: String::new(),
            ..ServerConfig::default()
        };
        assert!(server.validate().is_err());
    }

    #[test]
    fn zero_worker_count_is_rejected() {
        let worker = WorkerConfig {
            worker_count: 0,
            ..WorkerConfig::default()
        };
        assert!(worker.validate().is_err());
    }
}
