//! Configuration schema definitions.
//!
//! Configures the settings engine itself: where the blob lives and how
//! verbose logging is. All types derive Serde traits for deserialization from
//! a TOML file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Where settings are persisted.
    pub storage: StorageConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the settings blob (JSON).
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// `<config dir>/earbuds-companion/settings.json`, or a relative path when
/// the platform has no config directory.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("earbuds-companion"))
        .unwrap_or_default()
        .join("settings.json")
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
