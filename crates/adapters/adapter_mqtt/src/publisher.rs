//! [`StatePublisher`] backed by an MQTT client.

use rumqttc::{AsyncClient, QoS};

use mediola2mqtt_app::ports::StatePublisher;
use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

use crate::error::MqttError;
use crate::topics::Topics;

/// Publishes blind states as retained messages on their state topic.
#[derive(Clone)]
pub struct MqttStatePublisher {
    client: AsyncClient,
    topics: Topics,
}

impl MqttStatePublisher {
    #[must_use]
    pub fn new(client: AsyncClient, topics: Topics) -> Self {
        Self { client, topics }
    }
}

impl StatePublisher for MqttStatePublisher {
    async fn publish_state(&self, blind: &Blind, state: BlindState) -> Result<(), BridgeError> {
        let topic = self.topics.state(blind);
        tracing::debug!(%topic, %state, "publishing blind state");
        self.client
            .publish(topic, QoS::AtLeastOnce, true, state.as_wire())
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }
}
