//! Latchkey Core - shared configuration and wire types
//!
//! This crate provides the foundational types used across all Latchkey
//! components.

pub mod config;
pub mod protocol;

pub use config::Config;
pub use protocol::{ErrorResponse, ServerInfo, TokenResponse, UnlockResponse};
