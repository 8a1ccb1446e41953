//! MQTT adapter error types.

use mediola2mqtt_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to serialize a discovery descriptor.
    #[error("failed to encode discovery payload")]
    Discovery(#[source] serde_json::Error),
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        Self::Bus(Box::new(err))
    }
}

/// Why an inbound message was not turned into a blind command.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The topic is not a command topic of this bridge.
    #[error("unexpected topic {0:?}")]
    MalformedTopic(String),

    /// The command is addressed to another hub.
    #[error("command for foreign hub {0:?}")]
    ForeignHub(String),

    /// No configured blind matches the topic.
    #[error("no blind configured for {0:?}")]
    UnknownBlind(String),

    /// The payload is not `open`, `close` or `stop`.
    #[error("unrecognised payload {0:?}")]
    UnknownPayload(String),
}
