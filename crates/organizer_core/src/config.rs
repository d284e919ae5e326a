//! Runtime configuration for the organizer core.
//!
//! # Responsibility
//! - Provide defaults for storage location, logging and reminders.
//! - Apply `ORGANIZER_*` environment overrides with validation.
//!
//! # Invariants
//! - `log_level` is always a normalized level name.
//! - A quota of `0` disables quota enforcement.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::record_store::DEFAULT_QUOTA_BYTES;
use crate::service::reminder::DEFAULT_REMINDER_INTERVAL;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_FILE_NAME: &str = "organizer.sqlite3";

pub const ENV_DB_PATH: &str = "ORGANIZER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ORGANIZER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ORGANIZER_LOG_DIR";
pub const ENV_QUOTA_BYTES: &str = "ORGANIZER_QUOTA_BYTES";
pub const ENV_REMINDER_SECS: &str = "ORGANIZER_REMINDER_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizerConfig {
    /// SQLite file holding all four collections.
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
    pub storage_quota_bytes: Option<u64>,
    pub reminder_interval: Duration,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            storage_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            reminder_interval: DEFAULT_REMINDER_INTERVAL,
        }
    }
}

impl OrganizerConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values returned from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value.trim());
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&value)
                .map_err(|err| invalid(ENV_LOG_LEVEL, &value, err.to_string()))?
                .to_string();
        }
        if let Some(value) = get(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = get(ENV_QUOTA_BYTES) {
            let bytes = parse_u64(ENV_QUOTA_BYTES, &value)?;
            config.storage_quota_bytes = (bytes > 0).then_some(bytes);
        }
        if let Some(value) = get(ENV_REMINDER_SECS) {
            let secs = parse_u64(ENV_REMINDER_SECS, &value)?;
            if secs == 0 {
                return Err(invalid(ENV_REMINDER_SECS, &value, "must be positive".to_string()));
            }
            config.reminder_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| invalid(key, value, err.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, OrganizerConfig, ENV_QUOTA_BYTES, ENV_REMINDER_SECS};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = OrganizerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, OrganizerConfig::default());
        assert_eq!(config.reminder_interval, Duration::from_secs(3600));
    }

    #[test]
    fn overrides_are_applied_and_normalized() {
        let config = OrganizerConfig::from_lookup(lookup(&[
            ("ORGANIZER_DB_PATH", "/tmp/org.sqlite3"),
            ("ORGANIZER_LOG_LEVEL", "WARNING"),
            ("ORGANIZER_QUOTA_BYTES", "0"),
            ("ORGANIZER_REMINDER_SECS", "90"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/org.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.storage_quota_bytes, None);
        assert_eq!(config.reminder_interval, Duration::from_secs(90));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = OrganizerConfig::from_lookup(lookup(&[(ENV_QUOTA_BYTES, "lots")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_QUOTA_BYTES,
                ..
            }
        ));

        let err = OrganizerConfig::from_lookup(lookup(&[(ENV_REMINDER_SECS, "0")])).unwrap_err();
        assert!(err.to_string().contains(ENV_REMINDER_SECS));
    }
}
