//! Mediola hub configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for one Mediola hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediolaConfig {
    /// Hostname or IP address of the hub, optionally with `:port`.
    pub host: String,
    /// Identifier of the hub used in MQTT topics.
    pub hub_id: String,
    /// User name sent along with the password.
    pub user: String,
    /// Hub password. Empty means the hub is unprotected.
    pub password: String,
    /// Interval between follow-up polls of a travelling blind, in seconds.
    pub follow_up_secs: u64,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Pause before re-asking a hub that answered without a state, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for MediolaConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            hub_id: "mediola".to_string(),
            user: "user".to_string(),
            password: String::new(),
            follow_up_secs: 10,
            request_timeout_secs: 5,
            retry_delay_ms: 1000,
        }
    }
}

impl MediolaConfig {
    /// URL of the hub's command endpoint.
    #[must_use]
    pub fn command_url(&self) -> String {
        format!("http://{}/command", self.host)
    }

    #[must_use]
    pub fn follow_up_interval(&self) -> Duration {
        Duration::from_secs(self.follow_up_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
