//! Store configuration loaded from environment-style key lookups.
//!
//! # Responsibility
//! - Describe where the database lives and how connections are tuned.
//! - Describe whether and where file logging is started.
//!
//! # Invariants
//! - Missing keys fall back to `StoreConfig::default()` values.
//! - Present but unparsable values are rejected, never silently ignored.

use crate::logging::{default_log_level, init_logging};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "DEPTDB_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "DEPTDB_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "DEPTDB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DEPTDB_LOG_DIR";

/// Busy timeout applied to every connection unless configured otherwise.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    Logging(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for `{key}`")
            }
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Connection and logging settings for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging to the host process.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads configuration from `DEPTDB_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, one call per known key.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Starts file logging when `log_dir` is configured.
    ///
    /// Returns `Ok(false)` when no directory is set and nothing was started.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        let Some(dir) = self.log_dir.as_deref() else {
            return Ok(false);
        };
        let dir = dir.to_str().ok_or_else(|| ConfigError::InvalidValue {
            key: ENV_LOG_DIR,
            value: dir.display().to_string(),
        })?;
        init_logging(&self.log_level, dir).map_err(ConfigError::Logging)?;
        Ok(true)
    }
}
