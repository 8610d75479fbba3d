//! Configuration loading and representation.

use std::time::Duration;

use thiserror::Error;

use crate::balance_query::postgres::{DEFAULT_STATEMENTS_PER_ROUND_TRIP, MAX_STATEMENTS_PER_ROUND_TRIP};

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS: &str = "TALLY_DB_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_SECS: &str = "TALLY_DB_ACQUIRE_TIMEOUT_SECS";
pub const BATCH_MAX_STATEMENTS: &str = "TALLY_BATCH_MAX_STATEMENTS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Storage connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub max_statements_per_round_trip: usize,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            max_statements_per_round_trip: DEFAULT_STATEMENTS_PER_ROUND_TRIP,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset optional keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL))?;

        let mut config = Self::new(database_url);

        if let Some(raw) = lookup(MAX_CONNECTIONS) {
            config.max_connections = parse(MAX_CONNECTIONS, &raw)?;
            if config.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    key: MAX_CONNECTIONS,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if let Some(raw) = lookup(ACQUIRE_TIMEOUT_SECS) {
            config.acquire_timeout = Duration::from_secs(parse(ACQUIRE_TIMEOUT_SECS, &raw)?);
        }

        if let Some(raw) = lookup(BATCH_MAX_STATEMENTS) {
            let max: usize = parse(BATCH_MAX_STATEMENTS, &raw)?;
            if max == 0 || max > MAX_STATEMENTS_PER_ROUND_TRIP {
                return Err(ConfigError::Invalid {
                    key: BATCH_MAX_STATEMENTS,
                    reason: format!("must be between 1 and {MAX_STATEMENTS_PER_ROUND_TRIP}, got {max}"),
                });
            }
            config.max_statements_per_round_trip = max;
        }

        Ok(config)
    }
}

// Keeps credentials in the URL out of logs.
impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let redacted = match self.database_url.split_once('@') {
            Some((_, host)) => format!("postgres://***@{host}"),
            None => self.database_url.clone(),
        };
        f.debug_struct("DatabaseConfig")
            .field("database_url", &redacted)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("max_statements_per_round_trip", &self.max_statements_per_round_trip)
            .finish()
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("'{raw}': {e}"),
    })
}
