//! Command-line interface for the server binary.

use anyhow::Result;
use clap::Parser;
use issuetracker::config::{ConfigOverrides, EffectiveConfig, TrackerConfig};
use issuetracker::StorageBackend;
use std::path::PathBuf;

/// REST API server for the issue tracker
#[derive(Debug, Parser)]
#[command(name = "issuetracker-server", version, about)]
pub struct Args {
    /// Path to config.toml (default: <data-dir>/config.toml)
    #[arg(long, env = "ISSUETRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, env = "ISSUETRACKER_BIND")]
    pub bind: Option<String>,

    /// Root directory of the JSON store
    #[arg(long, env = "ISSUETRACKER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend: json or memory
    #[arg(long, env = "ISSUETRACKER_STORAGE")]
    pub storage: Option<StorageBackend>,

    /// Application name used in alert headers
    #[arg(long)]
    pub app_name: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl Args {
    /// Load the config file and apply flags and environment on top.
    ///
    /// # Errors
    ///
    /// Fails if the config file exists but cannot be read or parsed.
    pub fn effective_config(&self) -> Result<EffectiveConfig> {
        let file = match (&self.config, &self.data_dir) {
            (Some(path), _) => TrackerConfig::load(path)?,
            (None, Some(dir)) => TrackerConfig::load_from_dir(dir)?,
            (None, None) => TrackerConfig::load_from_dir(&PathBuf::from("."))?,
        };

        Ok(file.resolve(ConfigOverrides {
            app_name: self.app_name.clone(),
            bind: self.bind.clone(),
            backend: self.storage,
            data_dir: self.data_dir.clone(),
            log_filter: self.log_filter.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "issuetracker-server",
            "--bind",
            "0.0.0.0:9000",
            "--storage",
            "memory",
            "--app-name",
            "bugsApp",
        ])
        .unwrap();

        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.storage, Some(StorageBackend::Memory));
        assert_eq!(args.app_name.as_deref(), Some("bugsApp"));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let result = Args::try_parse_from(["issuetracker-server", "--storage", "sqlite"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_beat_config_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[server]\nbind = \"0.0.0.0:1\"\n\n[application]\nname = \"fileApp\"\n",
        )
        .unwrap();

        let data_dir = temp_dir.path().to_str().unwrap();
        let args = Args::try_parse_from([
            "issuetracker-server",
            "--data-dir",
            data_dir,
            "--bind",
            "127.0.0.1:2",
        ])
        .unwrap();
        let config = args.effective_config().unwrap();

        assert_eq!(config.bind, "127.0.0.1:2");
        assert_eq!(config.app_name, "fileApp");
        assert_eq!(config.data_dir, temp_dir.path());
    }
}
