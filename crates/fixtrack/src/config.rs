//! Application configuration.
//!
//! A single JSON file with serde defaults, so an empty `{}` is a valid
//! config and new fields never break existing installs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Notification toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    /// Send the customer an email when a job becomes ready for pickup.
    pub ready_for_pickup_email: bool,
    /// Notify staff on assignment and reassignment.
    pub assignment_notifications: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ready_for_pickup_email: true,
            assignment_notifications: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Database file path. `None` uses the per-user default location.
    pub database_path: Option<PathBuf>,
    pub notifications: NotificationConfig,
}

/// Loads the configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: AppConfig = serde_json::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(ref path) = config.database_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "databasePath must not be empty".to_string(),
            });
        }
    }
    Ok(())
}
