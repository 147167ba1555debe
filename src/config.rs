//! Console configuration
//!
//! A single JSON file:
//!
//! ```json
//! { "data_dir": "./data", "owner_id": "user_2f9", "log_level": "info" }
//! ```
//!
//! `data_dir` is required. `owner_id` tags new rows and is never checked.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Directory holding one JSON file per collection
    pub data_dir: PathBuf,

    /// Identity to tag created rows with
    #[serde(default)]
    pub owner_id: Option<String>,

    /// Minimum log severity (trace, info, warn, error, fatal)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConsoleConfig {
    /// Config with defaults for everything but the data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            owner_id: None,
            log_level: default_log_level(),
        }
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let config: ConsoleConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Unknown log_level '{}'",
                self.log_level
            )));
        }

        if matches!(&self.owner_id, Some(owner) if owner.trim().is_empty()) {
            return Err(ConfigError::Invalid("owner_id must not be blank".into()));
        }

        Ok(())
    }

    /// Parsed minimum severity; `Info` if unset or unknown
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }
}
