//! State publisher port: mirroring observed blind states to the bus.

use std::future::Future;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

/// Publishes observed blind states to interested subscribers.
pub trait StatePublisher: Send + Sync {
    /// Publish `state` for `blind`. At-least-once delivery is acceptable.
    fn publish_state(
        &self,
        blind: &Blind,
        state: BlindState,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
