//! Server Configuration Settings
//!
//! Configuration types for the push server, loaded from environment variables.

use std::time::Duration;

use crate::application::services::DEFAULT_TICK_INTERVAL;
use crate::domain::chat::DEFAULT_HISTORY_CAPACITY;

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Feed API HTTP port.
    pub http_port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            health_port: 8082,
        }
    }
}

/// Feed behaviour settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Number of chat messages retained and replayed to new subscribers.
    pub chat_history_capacity: usize,
    /// Period between counter ticks.
    pub tick_interval: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            chat_history_capacity: DEFAULT_HISTORY_CAPACITY,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Feed behaviour settings.
    pub feeds: FeedSettings,
}

impl PushConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparseable values fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is parseable but out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerSettings {
            http_port: parse_env_u16("PUSH_HTTP_PORT", ServerSettings::default().http_port),
            health_port: parse_env_u16("PUSH_HEALTH_PORT", ServerSettings::default().health_port),
        };

        let feeds = FeedSettings {
            chat_history_capacity: parse_env_usize(
                "PUSH_CHAT_HISTORY_CAPACITY",
                FeedSettings::default().chat_history_capacity,
            ),
            tick_interval: parse_env_duration_millis(
                "PUSH_TICK_INTERVAL_MS",
                FeedSettings::default().tick_interval,
            ),
        };

        let config = Self { server, feeds };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero history capacity or
    /// a zero tick interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feeds.chat_history_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "PUSH_CHAT_HISTORY_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        if self.feeds.tick_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "PUSH_TICK_INTERVAL_MS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable holds an out-of-range value.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
