//! Config loading and persistence.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Limits, workspace::DEFAULT_ROW_COUNT};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rows per workspace lane.
    pub row_count: u32,
    /// Batching ceilings, user-editable.
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            limits: Limits::default(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("LENSDESK_CONFIG")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }
    crate::paths::config_dir().join("config.toml")
}

pub fn load() -> Result<Config, ConfigError> {
    let path = config_path();
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load the config, falling back to defaults when the file is absent or
/// unreadable. Never fails; a broken file is logged and ignored.
pub fn load_or_init() -> Config {
    match load() {
        Ok(config) => config,
        Err(ConfigError::Read { .. }) => Config::default(),
        Err(err) => {
            tracing::warn!("config load failed, using defaults: {err}");
            Config::default()
        }
    }
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.display().to_string(),
            source,
        })?;
    }
    let contents = toml::to_string_pretty(config).expect("config serializes to TOML");
    fs::write(&path, contents).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
