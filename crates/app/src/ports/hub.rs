//! Hub port: reading and commanding blinds on the vendor hub.

use std::future::Future;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

/// Access to the blinds attached to a hub.
///
/// Implementations hide the vendor protocol entirely: callers only ever see
/// [`BlindState`] values and [`BridgeError`]s.
pub trait BlindHub: Send + Sync {
    /// Read the current state of `blind`.
    ///
    /// Transient "no data" answers from the hub are retried inside the
    /// implementation; only failures to reach the hub are returned.
    fn request_state(
        &self,
        blind: &Blind,
    ) -> impl Future<Output = Result<BlindState, BridgeError>> + Send;

    /// Ask the hub to move `blind`. Does not wait for the blind to react.
    fn send_command(
        &self,
        blind: &Blind,
        command: BlindCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
