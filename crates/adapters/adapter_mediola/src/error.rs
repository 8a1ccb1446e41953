//! Mediola adapter error types.

use mediola2mqtt_domain::error::BridgeError;

/// Errors specific to the Mediola adapter.
#[derive(Debug, thiserror::Error)]
pub enum MediolaError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The hub could not be reached, timed out, or answered with an error status.
    #[error("request to hub failed")]
    Request(#[source] reqwest::Error),
}

impl From<MediolaError> for BridgeError {
    fn from(err: MediolaError) -> Self {
        Self::Hub(Box::new(err))
    }
}
