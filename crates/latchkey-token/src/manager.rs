//! Token lifecycle rules
//!
//! The manager is the authority other components defer to for "is this
//! token usable right now". Validation never mutates state; consumption is
//! a separate [`TokenManager::finalize`] step so a token stays valid while
//! the relay call is in flight and a relay failure leaves it retryable.

use crate::store::{StoreError, TokenStore};
use crate::token::{AccessToken, TokenId};
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Session already has an active token")]
    Conflict,
    #[error("Unknown token: {0}")]
    NotFound(String),
    #[error("Token expired")]
    Expired,
    #[error("Token already used")]
    AlreadyUsed,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type TokenResult<T> = Result<T, TokenError>;

/// Issues tokens and enforces the one-active-token-per-session rule
pub struct TokenManager {
    /// Durable token records
    store: Arc<TokenStore>,
    /// Lifetime applied to newly issued tokens
    ttl: Duration,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new(store: Arc<TokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue a fresh token bound to `session` with the configured lifetime
    ///
    /// Fails with [`TokenError::Conflict`] while the session still owns a
    /// valid token.
    pub async fn issue(&self, session: &str) -> TokenResult<AccessToken> {
        self.issue_with_ttl(session, self.ttl).await
    }

    /// Issue a fresh token with an explicit lifetime
    pub async fn issue_with_ttl(&self, session: &str, ttl: Duration) -> TokenResult<AccessToken> {
        if self.find_active(session).await.is_some() {
            warn!("Refused issuance: session already owns an active token");
            return Err(TokenError::Conflict);
        }

        let token = AccessToken::new(session, ttl);
        self.store.insert(token.clone()).await?;
        info!("Issued token {} (expires {})", token.id, token.expires_at);
        Ok(token)
    }

    /// The session's token if it is valid right now
    ///
    /// At most one token per session can be active at any instant.
    pub async fn find_active(&self, session: &str) -> Option<AccessToken> {
        self.store.find_active(session, Utc::now()).await
    }

    /// Newest token ever issued to `session`, regardless of validity
    ///
    /// The unlock path resolves through this so a stale grant surfaces as a
    /// validation failure rather than silently vanishing.
    pub async fn latest_issued(&self, session: &str) -> Option<AccessToken> {
        self.store.latest_for_session(session).await
    }

    /// Check a token without consuming it
    pub async fn validate(&self, id: &TokenId) -> TokenResult<AccessToken> {
        let token = self
            .store
            .get(id)
            .await
            .ok_or_else(|| TokenError::NotFound(id.to_string()))?;

        // Expiry is checked first: an expired token reports Expired even
        // after consumption.
        if Utc::now() >= token.expires_at {
            return Err(TokenError::Expired);
        }
        if token.used {
            return Err(TokenError::AlreadyUsed);
        }
        Ok(token)
    }

    /// Consume a token after a confirmed unlock
    ///
    /// A second call yields [`TokenError::AlreadyUsed`] without touching
    /// state.
    pub async fn finalize(&self, id: &TokenId) -> TokenResult<()> {
        match self.store.mark_used(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TokenError::AlreadyUsed),
            Err(StoreError::NotFound(id)) => Err(TokenError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Total tokens ever issued
    pub async fn token_count(&self) -> usize {
        self.store.token_count().await
    }
}
