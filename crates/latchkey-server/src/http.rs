//! HTTP request handlers
//!
//! Serves the embedded status page and the token/unlock JSON API. Every
//! handler resolves the caller's session first and appends a Set-Cookie
//! header when this request minted the session key.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use latchkey_core::protocol::{ErrorResponse, ServerInfo, TokenResponse, UnlockResponse};
use latchkey_relay::RelayError;
use latchkey_token::TokenError;
use latchkey_web::Assets;
use std::sync::Arc;
use tracing::{debug, error};

use crate::session::{resolve_session, RequestSession};
use crate::state::AppState;
use crate::unlock::{unlock, UnlockError};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Status page and static assets
        .route("/", get(index_handler))
        .route("/assets/*path", get(asset_handler))
        // Token API
        .route("/generate", get(active_token_handler).post(generate_handler))
        .route("/unlock", post(unlock_handler))
        // Server info
        .route("/api/info", get(server_info_handler))
        .with_state(state)
}

/// Serve the status page
async fn index_handler(headers: HeaderMap) -> Response {
    let session = resolve_session(&headers);
    let response = match Assets::get("index.html") {
        Some(content) => Html(content.data.to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    };
    with_session_cookie(response, session)
}

/// Serve static assets with proper content types
async fn asset_handler(axum::extract::Path(path): axum::extract::Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    debug!("Serving asset: {}", path);

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime)],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

// ============================================================================
// Token API Handlers
// ============================================================================

/// Return the caller's active token, if any
async fn active_token_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = resolve_session(&headers);

    let response = match state.tokens.find_active(&session.key).await {
        Some(token) => {
            state.sessions.bind(&session.key, &token).await;
            Json(TokenResponse {
                token: token.id.to_string(),
                expires_at: token.expires_at,
            })
            .into_response()
        }
        None => {
            // lazy eviction: any stale binding goes with the dead token
            state.sessions.clear(&session.key).await;
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "No active token".to_string(),
                }),
            )
                .into_response()
        }
    };

    with_session_cookie(response, session)
}

/// Issue a new token for the caller's session
async fn generate_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = resolve_session(&headers);

    let response = match state.tokens.issue(&session.key).await {
        Ok(token) => {
            state.sessions.bind(&session.key, &token).await;
            Json(TokenResponse {
                token: token.id.to_string(),
                expires_at: token.expires_at,
            })
            .into_response()
        }
        Err(TokenError::Conflict) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Active token already exists".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Token issuance failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Token issuance failed".to_string(),
                }),
            )
                .into_response()
        }
    };

    with_session_cookie(response, session)
}

/// Exchange the session's token for a door unlock
async fn unlock_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = resolve_session(&headers);

    let response = match unlock(&state.tokens, &state.sessions, &state.relay, &session.key).await {
        Ok(_) => Json(UnlockResponse {
            success: true,
            message: "Door unlocked successfully!".to_string(),
        })
        .into_response(),
        Err(err) => {
            let (status, message) = unlock_failure(&err);
            (
                status,
                Json(UnlockResponse {
                    success: false,
                    message,
                }),
            )
                .into_response()
        }
    };

    with_session_cookie(response, session)
}

/// Map coordinator failures to status codes and user-facing messages
fn unlock_failure(err: &UnlockError) -> (StatusCode, String) {
    match err {
        UnlockError::NoActiveToken => (StatusCode::BAD_REQUEST, "No active token".to_string()),
        UnlockError::InvalidToken => (StatusCode::BAD_REQUEST, "Invalid token".to_string()),
        UnlockError::Relay(RelayError::Rejected(status)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unexpected response from door system: {}", status),
        ),
        UnlockError::Relay(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error communicating with door system: {}", err),
        ),
        UnlockError::Internal(err) => {
            error!("Unlock failed on the token store: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    }
}

// ============================================================================
// Server Info
// ============================================================================

/// Get server information
async fn server_info_handler(State(state): State<Arc<AppState>>) -> Json<ServerInfo> {
    Json(ServerInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        token_ttl_secs: state.config.token_ttl_secs,
        relay_url: state.config.relay_url.clone(),
        issued_tokens: state.tokens.token_count().await,
    })
}

/// Append the Set-Cookie header when this request minted a session
fn with_session_cookie(mut response: Response, session: RequestSession) -> Response {
    if let Some(cookie) = session.set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
