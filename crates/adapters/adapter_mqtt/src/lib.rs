//! # mediola2mqtt-adapter-mqtt
//!
//! MQTT adapter: the bus side of the bridge.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and keep reconnecting with a fixed backoff
//! - On every connection, subscribe to each blind's command topic and publish
//!   its discovery descriptor
//! - Decode inbound command messages into `(blind, command)` pairs, dropping
//!   anything that does not match a configured blind
//! - Publish observed blind states (see [`MqttStatePublisher`])
//!
//! ## Dependency rule
//! Same as other adapters: depends on `mediola2mqtt-app` and `mediola2mqtt-domain`.

mod config;
pub mod discovery;
mod error;
mod publisher;
pub mod topics;

pub use config::MqttConfig;
pub use error::{DecodeError, MqttError};
pub use publisher::MqttStatePublisher;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;

use discovery::{CoverDiscovery, DiscoveryDevice};
use topics::{CommandDecoder, Topics};

/// Capacity of the request channel between the client handles and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// A decoded inbound command.
pub type CommandRequest = (Blind, BlindCommand);

/// Owns the MQTT event loop for one hub's blinds.
pub struct MqttBridge {
    client: AsyncClient,
    event_loop: EventLoop,
    topics: Topics,
    decoder: CommandDecoder,
    blinds: Vec<Blind>,
    device: DiscoveryDevice,
    reconnect_backoff: Duration,
}

impl MqttBridge {
    /// Create the bridge and the publisher that shares its connection.
    ///
    /// Nothing is sent until [`run`](Self::run) drives the event loop.
    #[must_use]
    pub fn new(
        config: &MqttConfig,
        hub_id: &str,
        hub_host: &str,
        blinds: Vec<Blind>,
    ) -> (Self, MqttStatePublisher) {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.clone().unwrap_or_default());
        }
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let topics = Topics::new(&config.topic, hub_id, &config.discovery_prefix);
        let publisher = MqttStatePublisher::new(client.clone(), topics.clone());
        let bridge = Self {
            client,
            event_loop,
            decoder: CommandDecoder::new(topics.clone(), blinds.clone()),
            topics,
            blinds,
            device: DiscoveryDevice::for_host(hub_host),
            reconnect_backoff: config.reconnect_backoff(),
        };
        (bridge, publisher)
    }

    /// Drive the connection, forwarding decoded commands to `commands`.
    ///
    /// Runs until `commands` is closed. Connection failures are logged and
    /// retried after the reconnect backoff.
    pub async fn run(mut self, commands: mpsc::Sender<CommandRequest>) {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!(blinds = self.blinds.len(), "connected to MQTT broker");
                    tokio::spawn(announce(
                        self.client.clone(),
                        self.topics.clone(),
                        self.blinds.clone(),
                        self.device.clone(),
                    ));
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match self.decoder.decode(&publish.topic, &publish.payload) {
                        Ok(request) => {
                            if commands.send(request).await.is_err() {
                                tracing::debug!("command receiver closed, stopping MQTT bridge");
                                return;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(topic = %publish.topic, %err, "dropping MQTT message");
                        }
                    }
                }
                Ok(event) => tracing::trace!(?event, "MQTT event"),
                Err(err) => {
                    tracing::warn!(
                        %err,
                        backoff_secs = self.reconnect_backoff.as_secs(),
                        "MQTT connection error, reconnecting"
                    );
                    tokio::time::sleep(self.reconnect_backoff).await;
                }
            }
        }
    }
}

/// Subscribe to every command topic and publish every discovery descriptor.
///
/// Runs outside the event loop task so that a full request channel cannot
/// stall the loop that drains it.
async fn announce(client: AsyncClient, topics: Topics, blinds: Vec<Blind>, device: DiscoveryDevice) {
    for blind in &blinds {
        if let Err(err) = announce_blind(&client, &topics, blind, device.clone()).await {
            tracing::warn!(address = %blind.address, %err, "failed to announce blind");
        }
    }
}

async fn announce_blind(
    client: &AsyncClient,
    topics: &Topics,
    blind: &Blind,
    device: DiscoveryDevice,
) -> Result<(), MqttError> {
    client
        .subscribe(topics.command(blind), QoS::AtLeastOnce)
        .await
        .map_err(MqttError::Client)?;
    let payload = serde_json::to_vec(&CoverDiscovery::new(blind, topics, device))
        .map_err(MqttError::Discovery)?;
    client
        .publish(topics.discovery(blind), QoS::AtLeastOnce, true, payload)
        .await
        .map_err(MqttError::Client)?;
    tracing::debug!(address = %blind.address, name = %blind.name, "announced blind");
    Ok(())
}
