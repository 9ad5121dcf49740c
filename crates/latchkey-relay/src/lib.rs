//! Latchkey Relay
//!
//! Outbound client for the door relay: a single bounded-timeout trigger
//! call per unlock attempt. The outcome distinguishes "the relay said no"
//! from "the relay could not be reached" so the coordinator can report
//! each differently; retries are never attempted here.

mod client;
mod error;

pub use client::RelayClient;
pub use error::{RelayError, RelayResult};
