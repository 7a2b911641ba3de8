//! Queue configuration.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the lease duration in milliseconds
pub const LEASE_DURATION_ENV: &str = "MESSAGE_PROCESSING_TIME_MS";

/// Lease duration applied when nothing is configured
pub const DEFAULT_LEASE_DURATION_MS: u64 = 30_000;

/// Queue configuration, read once when the service is constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// How long a consumer may hold a message before it is redelivered.
    /// Zero is legal and expires leases on the next scheduler tick.
    pub lease_duration_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            lease_duration_ms: DEFAULT_LEASE_DURATION_MS,
        }
    }
}

impl QueueConfig {
    /// Load configuration from the process environment.
    ///
    /// An unset variable yields the default; a value that is not a
    /// non-negative integer is a configuration error.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        match std::env::var(LEASE_DURATION_ENV) {
            Ok(raw) => Self::parse_lease_duration(&raw),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigurationError::Invalid {
                key: LEASE_DURATION_ENV.to_string(),
                message: "value is not valid unicode".to_string(),
            }),
        }
    }

    /// Parse a lease duration expressed in milliseconds
    pub fn parse_lease_duration(raw: &str) -> Result<Self, ConfigurationError> {
        let lease_duration_ms =
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ConfigurationError::Invalid {
                    key: LEASE_DURATION_ENV.to_string(),
                    message: format!("'{}' is not a millisecond count: {}", raw, e),
                })?;

        Ok(Self { lease_duration_ms })
    }

    /// Lease duration as a [`Duration`]
    pub fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.lease_duration_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
