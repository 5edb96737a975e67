//! Server configuration
//!
//! Loads settings from an optional `config.toml` layered under `CHAT_RELAY_*`
//! environment variables. Every key has a default, so an empty environment
//! yields a working server on `127.0.0.1:4242`.

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

/// Paths tried for `config.toml`, lowest priority first.
pub const CONFIG_PATHS: [&str; 2] = [
    "chat-relay/config", // Container layout: /app/chat-relay/config.toml
    "config",            // Local development: ./config.toml
];

/// Environment prefix, e.g. `CHAT_RELAY_PORT=5000`.
pub const ENV_PREFIX: &str = "CHAT_RELAY";

/// Server configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind the listener
    pub bind_address: String,

    /// Listening port
    pub port: u16,

    /// Maximum concurrent clients, 0 for unlimited
    pub max_clients: usize,

    /// Longest accepted line in bytes, 0 for unlimited
    pub max_line_length: usize,

    /// Per-recipient write timeout in seconds, 0 to wait forever
    pub write_timeout_secs: u64,

    /// Chat lines allowed per window, 0 disables rate limiting
    pub rate_limit_messages: usize,
    pub rate_limit_window_secs: u64,

    /// Name given to clients whose first line is blank
    pub default_username: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 4242,
            max_clients: 0,
            max_line_length: 4096,
            write_timeout_secs: 5,
            rate_limit_messages: 0,
            rate_limit_window_secs: 1,
            default_username: None,
        }
    }
}

/// Builds a layered source from optional files plus the environment.
pub(crate) fn layered_sources(paths: &[&str]) -> ConfigBuilder<DefaultState> {
    let mut builder = Config::builder();
    for path in paths {
        builder = builder.add_source(File::with_name(path).required(false));
    }
    builder.add_source(Environment::with_prefix(ENV_PREFIX))
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&CONFIG_PATHS)
    }

    pub fn load_from(paths: &[&str]) -> Result<Self, ConfigError> {
        let settings = layered_sources(paths).build()?;
        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address cannot be empty".into()));
        }

        if self.rate_limit_messages > 0 && self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit_window_secs must be greater than 0 when rate limiting is on".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn max_clients_limit(&self) -> Option<usize> {
        (self.max_clients > 0).then_some(self.max_clients)
    }

    pub fn max_line_limit(&self) -> Option<usize> {
        (self.max_line_length > 0).then_some(self.max_line_length)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_secs > 0).then(|| Duration::from_secs(self.write_timeout_secs))
    }

    /// Messages per window, if rate limiting is enabled
    pub fn rate_limit(&self) -> Option<(usize, Duration)> {
        (self.rate_limit_messages > 0).then(|| {
            (
                self.rate_limit_messages,
                Duration::from_secs(self.rate_limit_window_secs),
            )
        })
    }
}
