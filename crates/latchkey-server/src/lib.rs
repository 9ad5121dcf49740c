//! Latchkey Server - axum HTTP surface
//!
//! Routes, session-cookie handling, the per-session token cache, and the
//! unlock coordinator.

pub mod http;
pub mod session;
pub mod state;
pub mod unlock;

pub use http::create_router;
pub use session::{CachedToken, SessionCache, SESSION_COOKIE};
pub use state::AppState;
pub use unlock::{unlock, UnlockError};
