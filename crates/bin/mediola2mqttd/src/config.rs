//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `mediola2mqtt.toml` in the working directory, or at the path in
//! `MEDIOLA2MQTT_CONFIG`. Everything but the hub host and the blind list has
//! a default. Environment variables take precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use mediola2mqtt_adapter_mediola::MediolaConfig;
use mediola2mqtt_adapter_mqtt::MqttConfig;
use mediola2mqtt_app::services::motion_controller::MotionConfig;
use mediola2mqtt_domain::blind::{Blind, DEFAULT_KIND};

const DEFAULT_PATH: &str = "mediola2mqtt.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hub connection settings.
    pub mediola: MediolaConfig,
    /// Motion loop tuning.
    pub motion: MotionSettings,
    /// Broker connection and topic settings.
    pub mqtt: MqttConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Blinds paired with the hub.
    pub blinds: Vec<BlindConfig>,
}

/// Motion loop tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Pause between sending a command and checking its effect, in milliseconds.
    pub command_delay_ms: u64,
    /// Pause after the hub could not be reached, in seconds.
    pub transport_error_backoff_secs: u64,
    /// Give up after this many sends. Unset retries forever.
    pub max_attempts: Option<u32>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One `[[blinds]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BlindConfig {
    /// Radio address, decimal or `0x`-prefixed hex.
    pub address: String,
    /// Display name.
    pub name: String,
    /// Vendor device type. Only `ER` is supported.
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MEDIOLA2MQTT_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.into());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("MEDIOLA_HOST") {
            self.mediola.host = val;
        }
        if let Some(val) = var("MEDIOLA_PASSWORD") {
            self.mediola.password = val;
        }
        if let Some(val) = var("MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = var("MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = var("MQTT_USERNAME") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = var("MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }
        if let Some(val) = var("MEDIOLA2MQTT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mediola.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mediola host must be set".to_string(),
            ));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker port must be non-zero".to_string(),
            ));
        }
        if self.mediola.follow_up_secs == 0 {
            return Err(ConfigError::Validation(
                "follow-up interval must be non-zero".to_string(),
            ));
        }
        if self.mediola.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request timeout must be non-zero".to_string(),
            ));
        }
        // Only ER blinds report their state and take `{address}{code}` moves.
        if let Some(entry) = self.blinds.iter().find(|entry| entry.kind != DEFAULT_KIND) {
            return Err(ConfigError::Validation(format!(
                "blind {:?}: unsupported kind {:?}, only {DEFAULT_KIND} is supported",
                entry.address, entry.kind
            )));
        }
        let mut seen = HashSet::new();
        for blind in self.blinds()? {
            if !seen.insert(blind.address.clone()) {
                return Err(ConfigError::Validation(format!(
                    "blind address {} is configured twice",
                    blind.address
                )));
            }
        }
        Ok(())
    }

    /// Build the domain blinds from the `[[blinds]]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unparseable address or an
    /// empty name.
    pub fn blinds(&self) -> Result<Vec<Blind>, ConfigError> {
        self.blinds
            .iter()
            .map(|entry| {
                Blind::builder()
                    .address(&entry.address)
                    .name(&entry.name)
                    .kind(&entry.kind)
                    .build()
                    .map_err(|err| {
                        ConfigError::Validation(format!("blind {:?}: {err}", entry.address))
                    })
            })
            .collect()
    }

    /// Motion loop settings in the form the controller expects.
    #[must_use]
    pub fn motion_config(&self) -> MotionConfig {
        MotionConfig {
            command_delay: Duration::from_millis(self.motion.command_delay_ms),
            transport_error_backoff: Duration::from_secs(self.motion.transport_error_backoff_secs),
            max_attempts: self.motion.max_attempts,
        }
    }
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            command_delay_ms: 1000,
            transport_error_backoff_secs: 5,
            max_attempts: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "mediola2mqttd=info,mediola2mqtt=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
