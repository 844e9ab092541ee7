//! Link configuration
//!
//! Stored as TOML under the user's config directory. Every key is optional;
//! missing keys take their defaults, and an unreadable file falls back to the
//! defaults as a whole so the link can always start.

use crate::controller::session::DevicePreference;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn, Level};

const CONFIG_DIR: &str = "controller-link";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Tick period of the live link
    pub poll_interval_ms: u64,
    /// How often the monitor prints the status readout
    pub report_interval_ms: u64,
    /// Which device kinds discovery may select
    pub device: DevicePreference,
    /// Maximum tracing level
    pub log_level: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16, // ~60 Hz
            report_interval_ms: 500,
            device: DevicePreference::Auto,
            log_level: "info".to_string(),
        }
    }
}

impl LinkConfig {
    /// `<config dir>/controller-link/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path =
            dirs::config_dir().ok_or_else(|| eyre!("Could not determine config directory"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Writes the default configuration if no file exists at `path`
    pub async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            debug!("Config file {} already exists", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        info!("Created default config at {}", path.display());
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))
    }

    /// Loads `path`, falling back to defaults on any failure
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(config) => {
                debug!("Loaded config: {:?}", config);
                config
            }
            Err(e) => {
                warn!("{}, using default config", e);
                Self::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }

    /// Parsed log level, `INFO` when unrecognized
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ensure_default_writes_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        LinkConfig::ensure_default_config(&path).await.unwrap();
        assert_eq!(LinkConfig::load(&path).await.unwrap(), LinkConfig::default());

        tokio::fs::write(&path, "poll_interval_ms = 5\n").await.unwrap();
        LinkConfig::ensure_default_config(&path).await.unwrap();
        assert_eq!(LinkConfig::load(&path).await.unwrap().poll_interval_ms, 5);
    }

    #[tokio::test]
    async fn missing_keys_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "device = \"mapped_only\"\nlog_level = \"debug\"\n")
            .await
            .unwrap();

        let config = LinkConfig::load(&path).await.unwrap();
        assert_eq!(config.device, DevicePreference::MappedOnly);
        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.poll_interval_ms, 16);
    }

    #[tokio::test]
    async fn broken_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "device = 42").await.unwrap();

        assert!(LinkConfig::load(&path).await.is_err());
        assert_eq!(LinkConfig::load_or_default(&path).await, LinkConfig::default());
        assert_eq!(
            LinkConfig::load_or_default(&dir.path().join("absent.toml")).await,
            LinkConfig::default()
        );
    }

    #[test]
    fn intervals_never_reach_zero() {
        let config = LinkConfig {
            poll_interval_ms: 0,
            report_interval_ms: 0,
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.report_interval(), Duration::from_millis(1));
        assert_eq!(config.level(), Level::INFO);
    }
}
