//! Access token entity and validity rules

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session key recorded on tokens persisted before session tracking existed
pub const LEGACY_SESSION: &str = "legacy";

/// Unique identifier for an access token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub Uuid);

impl TokenId {
    /// Generate a new random token ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-use, time-bounded unlock grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Unique token identifier
    pub id: TokenId,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Session that owns this token
    #[serde(default = "legacy_session")]
    pub session: String,
    /// Whether the token has been consumed by an unlock
    pub used: bool,
}

fn legacy_session() -> String {
    LEGACY_SESSION.to_string()
}

impl AccessToken {
    /// Create a new unused token expiring `ttl` from now
    ///
    /// `ttl` must be positive so `expires_at` stays after `created_at`.
    pub fn new(session: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: TokenId::new(),
            created_at: now,
            expires_at: now + ttl,
            session: session.into(),
            used: false,
        }
    }

    /// Unexpired and unused at `now`
    ///
    /// Computed on demand from the clock and the used flag.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && !self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_generation() {
        let id1 = TokenId::new();
        let id2 = TokenId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_token_is_valid() {
        let token = AccessToken::new("session-1", Duration::minutes(15));
        assert!(token.expires_at > token.created_at);
        assert!(!token.used);
        assert!(token.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let token = AccessToken::new("session-1", Duration::seconds(1));
        let later = token.expires_at + Duration::seconds(1);
        assert!(!token.is_valid_at(later));
        // boundary: validity ends exactly at expires_at
        assert!(!token.is_valid_at(token.expires_at));
    }

    #[test]
    fn test_used_token_is_invalid() {
        let mut token = AccessToken::new("session-1", Duration::minutes(15));
        token.used = true;
        assert!(!token.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_legacy_session_default() {
        let token = AccessToken::new("session-1", Duration::minutes(15));
        let mut value = serde_json::to_value(&token).unwrap();
        value.as_object_mut().unwrap().remove("session");
        let parsed: AccessToken = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.session, LEGACY_SESSION);
    }
}
