//! MQTT integration configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT side of the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Broker user name, if the broker requires authentication.
    pub username: Option<String>,
    /// Broker password.
    pub password: Option<String>,
    /// Base topic prefix for command and state topics.
    pub topic: String,
    /// Prefix under which discovery descriptors are published.
    pub discovery_prefix: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Pause between reconnection attempts, in seconds.
    pub reconnect_backoff_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "mediola2mqtt".to_string(),
            username: None,
            password: None,
            topic: "mediola".to_string(),
            discovery_prefix: "homeassistant".to_string(),
            keep_alive_secs: 30,
            reconnect_backoff_secs: 5,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }
}
