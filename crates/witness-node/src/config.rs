//! # Node Configuration
//!
//! Defaults with environment overrides:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `WH_SERVER_COUNT` | 3 |
//! | `WH_CHANNEL_ID` | `/root/witness/consensus` |
//! | `WH_SOCKET_CAPACITY` | 256 |
//! | `WH_ROUND_TIMEOUT_SECS` | 10 |
//! | `WH_CLIENTS_PER_SERVER` | 1 |

use shared_bus::DEFAULT_SOCKET_CAPACITY;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Witness servers in the federation.
    pub server_count: usize,
    /// Consensus channel every server hosts.
    pub channel_id: String,
    /// Frames buffered per connection before dropping.
    pub socket_capacity: usize,
    /// How long a round may take before giving up.
    pub round_timeout_secs: u64,
    /// Local clients subscribed on each server. Zero makes servers abstain.
    pub clients_per_server: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            server_count: 3,
            channel_id: "/root/witness/consensus".to_string(),
            socket_capacity: DEFAULT_SOCKET_CAPACITY,
            round_timeout_secs: 10,
            clients_per_server: 1,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("server count must be at least 1")]
    NoServers,

    #[error("socket capacity must be at least 1")]
    ZeroCapacity,

    #[error("round timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("channel id must not be empty")]
    EmptyChannel,
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::with_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(variable)`. Unparsable values are
    /// ignored with a warning.
    pub fn with_overrides(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_parsed(&lookup, "WH_SERVER_COUNT", &mut config.server_count);
        override_parsed(&lookup, "WH_SOCKET_CAPACITY", &mut config.socket_capacity);
        override_parsed(&lookup, "WH_ROUND_TIMEOUT_SECS", &mut config.round_timeout_secs);
        override_parsed(&lookup, "WH_CLIENTS_PER_SERVER", &mut config.clients_per_server);
        if let Some(channel_id) = lookup("WH_CHANNEL_ID") {
            config.channel_id = channel_id;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_count == 0 {
            return Err(ConfigError::NoServers);
        }
        if self.socket_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.round_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.channel_id.is_empty() {
            return Err(ConfigError::EmptyChannel);
        }
        Ok(())
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(variable = key, value = %raw, "Ignoring unparsable override"),
        }
    }
}
