//! Configuration module for mediabroker.

use serde::Deserialize;
use std::path::Path;

use crate::{BrokerError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed request origins. Empty list disables the origin check.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Maximum upload requests per client address within the rate window.
    #[serde(default = "default_upload_rate_limit")]
    pub upload_rate_limit: u32,
    /// Upload rate limit window in seconds.
    #[serde(default = "default_upload_rate_window")]
    pub upload_rate_window_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upload_rate_limit() -> u32 {
    100
}

fn default_upload_rate_window() -> u64 {
    15 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            upload_rate_limit: default_upload_rate_limit(),
            upload_rate_window_secs: default_upload_rate_window(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/mediabroker.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Local filesystem configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for per-user upload staging.
    #[serde(default = "default_staging_path")]
    pub staging_path: String,
    /// Base directory for per-user sidecar metadata files.
    #[serde(default = "default_sidecar_path")]
    pub sidecar_path: String,
}

fn default_staging_path() -> String {
    "data/staging".to_string()
}

fn default_sidecar_path() -> String {
    "data/metadata".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            staging_path: default_staging_path(),
            sidecar_path: default_sidecar_path(),
        }
    }
}

/// Remote storage server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the storage/encoding server.
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    /// Owner-scoped bearer credential sent with every call.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_remote_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_remote_timeout() -> u64 {
    120
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_base_url(),
            api_key: String::new(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mediabroker.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Local staging/sidecar storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Remote storage server configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BrokerError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BrokerError::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MEDIABROKER_API_KEY`: Override the remote storage credential
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("MEDIABROKER_API_KEY") {
            if !api_key.is_empty() {
                self.remote.api_key = api_key;
            }
        }
    }
}
