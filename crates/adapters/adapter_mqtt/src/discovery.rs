//! Discovery descriptors that let an automation platform pick up every blind
//! as a `cover` without manual configuration.

use serde::Serialize;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::state::BlindState;

use crate::topics::Topics;

/// Device block shared by all blinds of one hub.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: String,
    pub manufacturer: &'static str,
    pub name: &'static str,
}

impl DiscoveryDevice {
    /// Device block for the hub reachable at `host`.
    #[must_use]
    pub fn for_host(host: &str) -> Self {
        Self {
            identifiers: format!("mediola_blinds_{}", host.replace('.', "")),
            manufacturer: "Mediola",
            name: "Mediola Blind",
        }
    }
}

/// Retained `cover` descriptor for one blind.
#[derive(Debug, Clone, Serialize)]
pub struct CoverDiscovery {
    pub name: String,
    pub unique_id: String,
    pub device_class: &'static str,
    pub command_topic: String,
    pub state_topic: String,
    pub payload_open: &'static str,
    pub payload_close: &'static str,
    pub payload_stop: &'static str,
    pub state_open: &'static str,
    pub state_opening: &'static str,
    pub state_closed: &'static str,
    pub state_closing: &'static str,
    pub state_stopped: &'static str,
    pub optimistic: bool,
    pub device: DiscoveryDevice,
}

impl CoverDiscovery {
    #[must_use]
    pub fn new(blind: &Blind, topics: &Topics, device: DiscoveryDevice) -> Self {
        Self {
            name: blind.name.clone(),
            unique_id: topics.unique_id(blind),
            device_class: "blind",
            command_topic: topics.command(blind),
            state_topic: topics.state(blind),
            payload_open: BlindCommand::Open.as_payload(),
            payload_close: BlindCommand::Close.as_payload(),
            payload_stop: BlindCommand::Stop.as_payload(),
            state_open: BlindState::Opened.as_wire(),
            state_opening: BlindState::Opening.as_wire(),
            state_closed: BlindState::Closed.as_wire(),
            state_closing: BlindState::Closing.as_wire(),
            state_stopped: BlindState::Stopped.as_wire(),
            optimistic: false,
            device,
        }
    }
}
