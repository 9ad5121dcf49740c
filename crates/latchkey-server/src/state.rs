//! Shared application state

use crate::session::SessionCache;
use latchkey_core::Config;
use latchkey_relay::RelayClient;
use latchkey_token::TokenManager;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Token lifecycle authority
    pub tokens: Arc<TokenManager>,
    /// Outbound relay client
    pub relay: RelayClient,
    /// Per-session cached token references
    pub sessions: SessionCache,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, tokens: Arc<TokenManager>, relay: RelayClient) -> Self {
        Self {
            config,
            tokens,
            relay,
            sessions: SessionCache::new(),
        }
    }
}
