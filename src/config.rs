use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::save::DEFAULT_STORAGE_KEY;
use crate::scheduler::{DEFAULT_AUTOSAVE_SECS, DEFAULT_FACTORY_SECS};
use crate::state::DEFAULT_LOG_CAPACITY;

/// Tunables for a `VibeGame` session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub storage_key: String,
    pub autosave_interval_secs: f64,
    pub factory_interval_secs: f64,
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_SECS,
            factory_interval_secs: DEFAULT_FACTORY_SECS,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        for (field, value) in [
            ("autosave_interval_secs", self.autosave_interval_secs),
            ("factory_interval_secs", self.factory_interval_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Interval { field, value });
            }
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read engine config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage_key must not be empty")]
    EmptyStorageKey,
    #[error("{field} must be a positive number of seconds, got {value}")]
    Interval { field: &'static str, value: f64 },
    #[error("log_capacity must be at least 1")]
    ZeroLogCapacity,
}
