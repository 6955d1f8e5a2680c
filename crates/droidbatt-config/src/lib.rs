//! Configuration management for droidbatt
//!
//! TOML-based configuration with serde defaults for every field, so a
//! missing or partial file always yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Default polling interval in seconds
pub const DEFAULT_REFRESH_PERIOD: u64 = 10;

/// Default staleness timeout for charge estimates in seconds
pub const DEFAULT_ESTIMATE_PERIOD: u64 = 60;

/// Google Play supported devices,
/// https://support.google.com/googleplay/answer/1727131
pub const DEFAULT_FEED_URL: &str =
    "https://storage.googleapis.com/play_public/supported_devices.csv";

/// Main droidbatt configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Seconds between polling cycles
    pub refresh_period_secs: u64,

    /// Longest gap between estimate recomputations, in seconds
    pub estimate_period_secs: u64,

    pub feed: FeedConfig,

    pub storage: StorageConfig,
}

/// Remote reference feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// CSV feed URL
    pub url: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

/// Local persistence paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON cache file for the device reference table
    pub cache_file: PathBuf,

    /// SQLite settings database
    pub settings_db: PathBuf,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            refresh_period_secs: DEFAULT_REFRESH_PERIOD,
            estimate_period_secs: DEFAULT_ESTIMATE_PERIOD,
            feed: FeedConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("droidbatt");
        Self {
            cache_file: cache_dir.join("devices.json"),
            settings_db: cache_dir.join("settings.db"),
        }
    }
}

impl IndicatorConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default user location
    pub fn load_default() -> Result<Self, ConfigError> {
        let user_config = Self::default_path();
        if user_config.exists() {
            return Self::load(&user_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Default user configuration path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("droidbatt")
            .join("config.toml")
    }
}
