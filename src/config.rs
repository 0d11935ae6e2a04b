//! Application settings
//!
//! Settings come from an optional `config.json` in the platform config
//! directory (`~/.config/vitalvision/config.json` on Linux) or an explicit
//! path. Missing files mean defaults; command-line flags override both.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CacheConfig, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_ITEMS, DEFAULT_STORAGE_KEY};

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Errors loading the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("max_age_ms out of range: {0}")]
    InvalidMaxAge(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key the offline cache blob is stored under
    pub storage_key: String,
    /// Maximum record age in milliseconds
    pub max_age_ms: i64,
    /// Maximum records retained per category
    pub max_items: usize,
    /// Directory for the offline cache; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_age_ms: Duration::days(DEFAULT_MAX_AGE_DAYS).num_milliseconds(),
            max_items: DEFAULT_MAX_ITEMS,
            data_dir: None,
        }
    }
}

impl Settings {
    /// Loads settings from the platform config directory, or defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Default location of the settings file
    pub fn config_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "vitalvision")?;
        Some(project_dirs.config_dir().join(CONFIG_FILE))
    }

    /// Retention settings for the offline cache
    ///
    /// Fails if `max_age_ms` cannot be represented as a duration.
    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        let max_age = Duration::try_milliseconds(self.max_age_ms)
            .ok_or(ConfigError::InvalidMaxAge(self.max_age_ms))?;

        Ok(CacheConfig {
            storage_key: self.storage_key.clone(),
            max_age,
            max_items: self.max_items,
        })
    }
}
