//! Outbound trigger call to the door relay

use crate::error::{RelayError, RelayResult};
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client for the external door relay
///
/// Fires exactly one trigger request per call; retrying is the caller's
/// responsibility via a fresh unlock attempt.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// Build a client with a bounded request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The configured relay endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fire the unlock trigger once
    ///
    /// Success is any 2xx response. Other statuses map to
    /// [`RelayError::Rejected`]; timeouts and transport failures map to
    /// [`RelayError::Unreachable`].
    pub async fn trigger(&self) -> RelayResult<()> {
        debug!("Triggering relay at {}", self.endpoint);

        let response = self.client.get(&self.endpoint).send().await.map_err(|e| {
            error!("Error calling relay: {}", e);
            RelayError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("Relay accepted the trigger");
            Ok(())
        } else {
            error!("Relay returned unexpected status code: {}", status);
            Err(RelayError::Rejected(status.as_u16()))
        }
    }
}
