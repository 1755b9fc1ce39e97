//! Host-supplied configuration for the custody core.
//!
//! # Responsibility
//! - Describe where the database lives and how logging is set up.
//! - Bootstrap logging and storage from one validated value.
//!
//! # Invariants
//! - `open_core` never opens storage with an invalid config.
//! - Logging is only started when `log_dir` is configured.

use crate::db::{open_db_in_memory, open_db_with_timeout, DbError};
use crate::logging::{default_log_level, init_logging};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration failure.
#[derive(Debug)]
pub enum ConfigError {
    /// JSON could not be parsed into `CoreConfig`.
    Parse(serde_json::Error),
    /// A field holds an unusable value.
    Invalid(String),
    /// Logging backend refused to start.
    Logging(String),
    /// Storage could not be opened or migrated.
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid core config: {err}"),
            Self::Invalid(message) => write!(f, "invalid core config: {message}"),
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Invalid(_) | Self::Logging(_) => None,
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Core configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file. `None` keeps the database in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` leaves logging to the host.
    pub log_dir: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be blank".to_string()));
        }
        if let Some(db_path) = self.db_path.as_ref() {
            if db_path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("db_path must not be empty".to_string()));
            }
        }
        if let Some(log_dir) = self.log_dir.as_ref() {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Starts logging (when configured) and opens the migrated database.
pub fn open_core(config: &CoreConfig) -> Result<Connection, ConfigError> {
    config.validate()?;

    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy()).map_err(ConfigError::Logging)?;
    }

    let conn = match config.db_path.as_ref() {
        Some(path) => open_db_with_timeout(path, config.busy_timeout())?,
        None => open_db_in_memory()?,
    };
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::{open_core, ConfigError, CoreConfig};

    #[test]
    fn empty_json_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"dbPath": "/tmp/x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn open_core_opens_file_database_without_logging() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            db_path: Some(dir.path().join("core.sqlite3")),
            ..CoreConfig::default()
        };

        let conn = open_core(&config).unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::db::migrations::latest_version());
        assert!(dir.path().join("core.sqlite3").exists());
    }
}
