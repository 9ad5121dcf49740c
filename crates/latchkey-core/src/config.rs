//! Configuration types for Latchkey

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for Latchkey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Relay endpoint triggered on a successful unlock
    pub relay_url: String,
    /// Relay request timeout in seconds
    pub relay_timeout_secs: u64,
    /// Token store path (per-user config directory if None)
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            token_ttl_secs: 900,
            relay_url: "http://127.0.0.1:8444/trigger".to_string(),
            relay_timeout_secs: 10,
            store_path: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder pattern: set token lifetime in seconds
    pub fn with_token_ttl_secs(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    /// Builder pattern: set the relay endpoint
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }

    /// Builder pattern: set the relay timeout in seconds
    pub fn with_relay_timeout_secs(mut self, secs: u64) -> Self {
        self.relay_timeout_secs = secs;
        self
    }

    /// Builder pattern: set the token store path
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        self.store_path = path;
        self
    }

    /// Token lifetime as a chrono duration
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs as i64)
    }

    /// Relay timeout as a std duration
    pub fn relay_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.relay_timeout_secs)
    }
}
