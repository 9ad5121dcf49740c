//! Unlock coordination
//!
//! Resolves the caller's active token, validates it, fires the relay once,
//! and consumes the token only after the relay confirms success. A relay
//! failure leaves the token untouched so the same grant can be retried
//! until it expires.

use crate::session::SessionCache;
use chrono::Utc;
use latchkey_relay::{RelayClient, RelayError};
use latchkey_token::{AccessToken, TokenError, TokenManager};
use thiserror::Error;
use tracing::{info, warn};

/// Unlock failures
#[derive(Debug, Error)]
pub enum UnlockError {
    /// The session holds no unlock grant at all
    #[error("No active token")]
    NoActiveToken,

    /// The resolved token is expired, consumed, or unknown
    #[error("Invalid token")]
    InvalidToken,

    /// The relay declined or could not be reached
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Store-level failure unrelated to token state
    #[error("Token store failure: {0}")]
    Internal(TokenError),
}

/// Exchange the session's token for one door unlock
///
/// Returns the consumed token on success.
pub async fn unlock(
    tokens: &TokenManager,
    sessions: &SessionCache,
    relay: &RelayClient,
    session: &str,
) -> Result<AccessToken, UnlockError> {
    // Resolve the token reference: cached binding first, then the store.
    // The fallback deliberately ignores validity so a stale grant fails
    // validation below instead of silently vanishing.
    let token_id = match sessions.lookup(session, Utc::now()).await {
        Some(entry) => entry.token_id,
        None => match tokens.latest_issued(session).await {
            Some(token) => {
                if token.is_valid_at(Utc::now()) {
                    sessions.bind(session, &token).await;
                }
                token.id
            }
            None => return Err(UnlockError::NoActiveToken),
        },
    };

    // Validate without consuming; the token must stay usable while the
    // relay call is in flight.
    let token = match tokens.validate(&token_id).await {
        Ok(token) => token,
        Err(TokenError::NotFound(_)) | Err(TokenError::Expired) | Err(TokenError::AlreadyUsed) => {
            warn!("Unlock refused: token {} is no longer valid", token_id);
            sessions.clear(session).await;
            return Err(UnlockError::InvalidToken);
        }
        Err(e) => return Err(UnlockError::Internal(e)),
    };

    // One relay call per attempt; a failure propagates with the token
    // still valid for retry.
    relay.trigger().await?;

    // Consume only after confirmed success.
    match tokens.finalize(&token.id).await {
        Ok(()) => {
            info!("Door unlocked with token {}", token.id);
            Ok(token)
        }
        Err(TokenError::AlreadyUsed) => {
            // a concurrent attempt won the race
            sessions.clear(session).await;
            Err(UnlockError::InvalidToken)
        }
        Err(e) => Err(UnlockError::Internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use chrono::Duration;
    use latchkey_token::{TokenId, TokenStore};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    async fn spawn_relay(status: StatusCode) -> String {
        let app = Router::new().route("/trigger", get(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/trigger", addr)
    }

    async fn create_manager() -> (Arc<TokenManager>, TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            TokenStore::with_path(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let manager = Arc::new(TokenManager::new(store, Duration::minutes(15)));
        (manager, dir)
    }

    fn relay_client(url: String) -> RelayClient {
        RelayClient::new(url, std::time::Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_unlock_consumes_token() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();
        let relay = relay_client(spawn_relay(StatusCode::OK).await);

        let issued = tokens.issue("session-1").await.unwrap();

        let unlocked = unlock(&tokens, &sessions, &relay, "session-1")
            .await
            .unwrap();
        assert_eq!(unlocked.id, issued.id);

        // the token is now terminal
        assert!(matches!(
            tokens.validate(&issued.id).await,
            Err(TokenError::AlreadyUsed)
        ));
        assert!(tokens.find_active("session-1").await.is_none());
    }

    #[tokio::test]
    async fn test_repeat_unlock_fails_invalid() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();
        let relay = relay_client(spawn_relay(StatusCode::OK).await);

        tokens.issue("session-1").await.unwrap();
        unlock(&tokens, &sessions, &relay, "session-1")
            .await
            .unwrap();

        // cached binding still points at the consumed token
        let second = unlock(&tokens, &sessions, &relay, "session-1").await;
        assert!(matches!(second, Err(UnlockError::InvalidToken)));

        // binding cleared; the store fallback resolves the same dead grant
        let third = unlock(&tokens, &sessions, &relay, "session-1").await;
        assert!(matches!(third, Err(UnlockError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_unlock_without_token() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();
        let relay = relay_client(spawn_relay(StatusCode::OK).await);

        let result = unlock(&tokens, &sessions, &relay, "session-1").await;
        assert!(matches!(result, Err(UnlockError::NoActiveToken)));
    }

    #[tokio::test]
    async fn test_relay_rejection_keeps_token_valid() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();
        let bad_relay = relay_client(spawn_relay(StatusCode::SERVICE_UNAVAILABLE).await);

        let issued = tokens.issue("session-1").await.unwrap();

        let result = unlock(&tokens, &sessions, &bad_relay, "session-1").await;
        assert!(matches!(
            result,
            Err(UnlockError::Relay(RelayError::Rejected(503)))
        ));

        // unchanged: the same grant validates and can still succeed
        tokens.validate(&issued.id).await.unwrap();
        let good_relay = relay_client(spawn_relay(StatusCode::OK).await);
        let unlocked = unlock(&tokens, &sessions, &good_relay, "session-1")
            .await
            .unwrap();
        assert_eq!(unlocked.id, issued.id);
    }

    #[tokio::test]
    async fn test_relay_unreachable_keeps_token_valid() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dead_relay = relay_client(format!("http://{}/trigger", addr));

        let issued = tokens.issue("session-1").await.unwrap();

        let result = unlock(&tokens, &sessions, &dead_relay, "session-1").await;
        assert!(matches!(
            result,
            Err(UnlockError::Relay(RelayError::Unreachable(_)))
        ));
        tokens.validate(&issued.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_token_clears_binding() {
        let dir = tempdir().unwrap();
        let sessions = SessionCache::new();
        let relay = relay_client(spawn_relay(StatusCode::OK).await);

        // a token that expired an hour ago, resolved via the store fallback
        let now = Utc::now();
        let expired = AccessToken {
            id: TokenId::new(),
            created_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
            session: "session-1".to_string(),
            used: false,
        };
        let store = Arc::new(
            TokenStore::with_path(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        store.insert(expired).await.unwrap();
        let tokens = Arc::new(TokenManager::new(store, Duration::minutes(15)));

        let result = unlock(&tokens, &sessions, &relay, "session-1").await;
        assert!(matches!(result, Err(UnlockError::InvalidToken)));

        assert!(sessions.lookup("session-1", Utc::now()).await.is_none());
        assert!(tokens.find_active("session-1").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_unlocks_single_winner() {
        let (tokens, _dir) = create_manager().await;
        let sessions = SessionCache::new();
        let relay = relay_client(spawn_relay(StatusCode::OK).await);

        tokens.issue("session-1").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let tokens = tokens.clone();
            let sessions = sessions.clone();
            let relay = relay.clone();
            handles.push(tokio::spawn(async move {
                unlock(&tokens, &sessions, &relay, "session-1").await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
