//! Process configuration for the scheduling core.
//!
//! Values come from `CARELINK_*` environment variables; callers may override
//! individual fields afterwards (the CLI does so from its flags).

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CARELINK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CARELINK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CARELINK_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "carelink.sqlite3";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    EmptyValue(&'static str),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(level) => write!(
                f,
                "invalid log level `{level}`; expected one of {}",
                LOG_LEVELS.join("|")
            ),
            Self::EmptyValue(key) => write!(f, "`{key}` is set but empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "log directory must be absolute, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, then validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(DB_PATH_ENV) {
            config.db_path = PathBuf::from(non_empty(DB_PATH_ENV, path)?);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = non_empty(LOG_LEVEL_ENV, level)?;
        }
        if let Some(dir) = lookup(LOG_DIR_ENV) {
            config.log_dir = Some(PathBuf::from(non_empty(LOG_DIR_ENV, dir)?));
        }
        config.validate()?;
        Ok(config)
    }

    /// Normalizes the level and checks the log directory shape.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        self.log_level = level;

        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }
}

fn non_empty(key: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ConfigError::EmptyValue(key))
    } else {
        Ok(trimmed.to_string())
    }
}
