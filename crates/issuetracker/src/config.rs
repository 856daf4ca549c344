//! Configuration file loading and parsing.
//!
//! The tracker reads an optional `config.toml`. If no config file exists, the
//! system falls back to sensible defaults. Command-line flags and environment
//! variables are applied on top through [`ConfigOverrides`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_APP_NAME: &str = "issuetrackerApp";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "issuetracker=info,issuetracker_server=info,tower_http=info";

/// Root configuration structure loaded from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Application identity (optional).
    pub application: Option<ApplicationConfig>,
    /// HTTP server settings (optional).
    pub server: Option<ServerConfig>,
    /// Storage backend settings (optional).
    pub storage: Option<StorageConfig>,
    /// Log filtering (optional).
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationConfig {
    /// Name used in alert headers (default: "issuetrackerApp").
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on (default: "127.0.0.1:8080").
    pub bind: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// "json" or "memory" (default: "json").
    pub backend: Option<StorageBackend>,
    /// Root directory of the JSON store (default: the config directory).
    pub data_dir: Option<PathBuf>,
    /// How long a writer waits for the store lock (default: 5000).
    pub lock_timeout_ms: Option<u64>,
}

impl StorageConfig {
    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or_default()
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive (default: info for the tracker crates).
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn filter(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

/// Which [`IssueStore`](crate::storage::IssueStore) backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StorageBackend::Json),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "Unknown storage backend '{}' (expected 'json' or 'memory')",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from `path` if it exists.
    ///
    /// Returns an empty config (all sections None) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            // No config file - return empty config (will use defaults)
            return Ok(TrackerConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: TrackerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    /// Load `config.toml` from a data directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    /// Merge with overrides; overrides win, then file values, then defaults.
    pub fn resolve(&self, overrides: ConfigOverrides) -> EffectiveConfig {
        let storage = self.storage.clone().unwrap_or_default();

        EffectiveConfig {
            app_name: overrides
                .app_name
                .or_else(|| self.application.as_ref().and_then(|a| a.name.clone()))
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            bind: overrides
                .bind
                .or_else(|| self.server.as_ref().and_then(|s| s.bind.clone()))
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            backend: overrides.backend.unwrap_or_else(|| storage.backend()),
            data_dir: overrides
                .data_dir
                .or_else(|| storage.data_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            lock_timeout: storage.lock_timeout(),
            log_filter: overrides
                .log_filter
                .unwrap_or_else(|| self.logging.clone().unwrap_or_default().filter()),
        }
    }
}

/// Values from the command line or environment that beat the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub app_name: Option<String>,
    pub bind: Option<String>,
    pub backend: Option<StorageBackend>,
    pub data_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub app_name: String,
    pub bind: String,
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub lock_timeout: Duration,
    pub log_filter: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        TrackerConfig::default().resolve(ConfigOverrides::default())
    }
}
