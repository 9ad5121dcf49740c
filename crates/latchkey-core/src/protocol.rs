//! JSON wire types shared by the HTTP API and the status page

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Active-token payload returned by the generate endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Token identifier to present for unlock
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Outcome payload returned by `POST /unlock`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    /// Whether the door was unlocked
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
}

/// Error payload for client-state failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Server metadata returned by `GET /api/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server version
    pub version: String,
    /// Configured token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Configured relay endpoint
    pub relay_url: String,
    /// Total tokens ever issued (tokens are retained for audit)
    pub issued_tokens: usize,
}
