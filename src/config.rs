//! Configuration Management
//!
//! Handles persistent configuration for ucprov.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::databricks::http::HttpOptions;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Workspace host, e.g. `adb-123.4.azuredatabricks.net`
    #[serde(default)]
    pub host: Option<String>,
    /// Profile to read from `~/.databrickscfg`
    #[serde(default)]
    pub profile: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Treat any lookup failure as "absent" (see `--lenient-lookup`)
    #[serde(default)]
    pub lenient_lookup: bool,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ucprov").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse configuration, falling back to defaults on malformed content
    pub fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config file: {}", e);
            Self::default()
        })
    }

    /// HTTP transport settings (CLI > config > default)
    pub fn http_options(&self, timeout_override: Option<u64>) -> HttpOptions {
        let mut options = HttpOptions::default();
        if let Some(secs) = timeout_override.or(self.timeout_secs) {
            options.timeout = Duration::from_secs(secs.max(1));
        }
        options
    }
}
