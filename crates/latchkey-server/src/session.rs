//! Session identity and the per-session token cache
//!
//! Session identity is an opaque cookie minted on first contact. The cache
//! keeps `{token_id, expires_at}` per session to skip a store lookup on
//! every request; the token manager stays authoritative and entries are
//! revalidated against the clock before trust.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use latchkey_token::{AccessToken, TokenId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "latchkey_session";

/// Extract the session key from the Cookie header
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Session resolved for one request
pub struct RequestSession {
    /// Opaque session key
    pub key: String,
    /// Set-Cookie value when this request minted the key
    pub set_cookie: Option<String>,
}

/// Resolve the caller's session, minting a new one if absent
pub fn resolve_session(headers: &HeaderMap) -> RequestSession {
    match session_from_headers(headers) {
        Some(key) => RequestSession {
            key,
            set_cookie: None,
        },
        None => {
            let key = Uuid::new_v4().to_string();
            debug!("Minted session {}", key);
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, key
            );
            RequestSession {
                key,
                set_cookie: Some(cookie),
            }
        }
    }
}

/// Cached reference to a session's current token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// Token the session is bound to
    pub token_id: TokenId,
    /// Expiry copied from the token at bind time
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Eviction decision: the entry survives only while `now` is before
    /// its expiry
    pub fn live_at(self, now: DateTime<Utc>) -> Option<Self> {
        (now < self.expires_at).then_some(self)
    }
}

/// Session-keyed cache of token references
///
/// A shortcut over the token store, never a source of truth for validity
/// beyond the expiry comparison.
#[derive(Clone, Default)]
pub struct SessionCache {
    entries: Arc<RwLock<HashMap<String, CachedToken>>>,
}

impl SessionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `token` as the session's current grant
    pub async fn bind(&self, session: &str, token: &AccessToken) {
        let mut entries = self.entries.write().await;
        entries.insert(
            session.to_string(),
            CachedToken {
                token_id: token.id.clone(),
                expires_at: token.expires_at,
            },
        );
    }

    /// The cached entry if it is still unexpired
    ///
    /// Stale entries are removed on the way out.
    pub async fn lookup(&self, session: &str, now: DateTime<Utc>) -> Option<CachedToken> {
        let mut entries = self.entries.write().await;
        let entry = entries.get(session).cloned()?;
        match entry.live_at(now) {
            Some(live) => Some(live),
            None => {
                entries.remove(session);
                debug!("Evicted expired token reference for session");
                None
            }
        }
    }

    /// Drop the session's entry
    pub async fn clear(&self, session: &str) {
        self.entries.write().await.remove(session);
    }
}
