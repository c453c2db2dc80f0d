use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::dates::{DEFAULT_DUE_SOON_DAYS, DEFAULT_STALE_DAYS};
use crate::error::ErrorCode;

/// Environment variable that overrides the database location.
pub const DATABASE_ENV: &str = "TASKBOARD_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Day thresholds behind the derived flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            stale_days: default_stale_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_short_title_max")]
    pub project_title_max: usize,
    #[serde(default = "default_short_title_max")]
    pub story_title_max: usize,
    #[serde(default = "default_task_title_max")]
    pub task_title_max: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            project_title_max: default_short_title_max(),
            story_title_max: default_short_title_max(),
            task_title_max: default_task_title_max(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// A config file that exists but is not valid TOML for [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, or a
/// [`ConfigError::Parse`] if it cannot be parsed.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Load `<config_dir>/taskboard/config.toml`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Config> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(Config::default());
    };
    load_config(&config_dir.join("taskboard/config.toml"))
}

/// Where the database lives: `TASKBOARD_DB`, then `storage.database`,
/// then the platform data directory.
///
/// # Errors
///
/// Returns an error when no location can be determined.
pub fn resolve_database_path(config: &Config) -> Result<PathBuf> {
    resolve_database_path_with(config, env::var_os(DATABASE_ENV).map(PathBuf::from))
}

fn resolve_database_path_with(config: &Config, env_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = &config.storage.database {
        return Ok(path.clone());
    }
    let data_dir = dirs::data_dir().context("no platform data directory; set TASKBOARD_DB")?;
    Ok(data_dir.join("taskboard/taskboard.sqlite3"))
}

const fn default_due_soon_days() -> i64 {
    DEFAULT_DUE_SOON_DAYS
}

const fn default_stale_days() -> i64 {
    DEFAULT_STALE_DAYS
}

const fn default_short_title_max() -> usize {
    100
}

const fn default_task_title_max() -> usize {
    200
}
