use std::time::Duration;

use falta_uno_app::{LifecycleSettings, ZeroSweepPeriod};
use thiserror::Error;

const SWEEP_INTERVAL_VAR: &str = "MATCH_SWEEP_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidDuration { name: &'static str, value: String },
    #[error(transparent)]
    Lifecycle(#[from] ZeroSweepPeriod),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: String,
    pub log_file_path: String,
    pub log_archive_pattern: String,
    pub lifecycle: LifecycleSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let lifecycle = match lookup(SWEEP_INTERVAL_VAR) {
            Some(value) => {
                LifecycleSettings::new(parse_positive_secs(SWEEP_INTERVAL_VAR, &value)?)?
            }
            None => LifecycleSettings::default(),
        };

        Ok(Self {
            database_path: required("FALTA_UNO_DB")?,
            log_file_path: required("LOG_FILE_PATH")?,
            log_archive_pattern: required("LOG_ARCHIVE_PATTERN")?,
            lifecycle,
        })
    }
}

fn parse_positive_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidDuration {
            name,
            value: value.to_string(),
        }),
    }
}
