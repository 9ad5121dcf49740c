//! Relay error types

use thiserror::Error;

/// Errors from the outbound unlock trigger
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay answered with a non-success status
    #[error("Relay rejected the trigger (status {0})")]
    Rejected(u16),

    /// The relay could not be reached before the timeout
    #[error("Relay unreachable: {0}")]
    Unreachable(String),

    /// The client could not be constructed
    #[error("Failed to build relay client: {0}")]
    Client(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
