//! Latchkey Token - token store and lifecycle engine
//!
//! Issues short-lived, single-use unlock tokens and decides whether a token
//! is usable right now. Validity is always computed from the clock and the
//! used flag; it is never cached as stored state.
//!
//! # Lifecycle
//!
//! 1. [`TokenManager::issue`] creates a token bound to the caller's session
//! 2. [`TokenManager::validate`] checks a token without consuming it
//! 3. The unlock coordinator fires the relay between validate and finalize
//! 4. [`TokenManager::finalize`] consumes the token after confirmed success
//!
//! A relay failure between steps 2 and 4 leaves the token valid, so the
//! same grant can be retried until it naturally expires.

pub mod manager;
pub mod store;
pub mod token;

pub use manager::{TokenError, TokenManager, TokenResult};
pub use store::{StoreError, StoreResult, TokenStore};
pub use token::{AccessToken, TokenId, LEGACY_SESSION};
