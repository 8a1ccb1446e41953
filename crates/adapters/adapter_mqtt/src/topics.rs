//! Topic layout and inbound command decoding.
//!
//! | Purpose | Topic |
//! |---------|-------|
//! | Command | `{topic}/blinds/{hub_id}/{kind}_{address}/set` |
//! | State | `{topic}/blinds/{hub_id}/{kind}_{address}/state` |
//! | Discovery | `{discovery_prefix}/cover/{hub_id}_{kind}_{address}/config` |

use mediola2mqtt_domain::blind::{Blind, BlindAddress};
use mediola2mqtt_domain::command::BlindCommand;

use crate::error::DecodeError;

/// Builds and parses the topics used for one hub.
#[derive(Debug, Clone)]
pub struct Topics {
    base: String,
    hub_id: String,
    discovery_prefix: String,
}

impl Topics {
    #[must_use]
    pub fn new(
        base: impl Into<String>,
        hub_id: impl Into<String>,
        discovery_prefix: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            hub_id: hub_id.into(),
            discovery_prefix: discovery_prefix.into(),
        }
    }

    fn blind_root(&self, blind: &Blind) -> String {
        format!(
            "{}/blinds/{}/{}",
            self.base,
            self.hub_id,
            blind.identifier()
        )
    }

    /// Topic on which commands for `blind` arrive.
    #[must_use]
    pub fn command(&self, blind: &Blind) -> String {
        format!("{}/set", self.blind_root(blind))
    }

    /// Topic on which the state of `blind` is published.
    #[must_use]
    pub fn state(&self, blind: &Blind) -> String {
        format!("{}/state", self.blind_root(blind))
    }

    /// Unique id of `blind` across hubs.
    #[must_use]
    pub fn unique_id(&self, blind: &Blind) -> String {
        format!("{}_{}", self.hub_id, blind.identifier())
    }

    /// Topic of the discovery descriptor for `blind`.
    #[must_use]
    pub fn discovery(&self, blind: &Blind) -> String {
        format!(
            "{}/cover/{}/config",
            self.discovery_prefix,
            self.unique_id(blind)
        )
    }

    /// Split a command topic into `(kind, address)`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedTopic`] when the topic does not follow
    /// the command layout and [`DecodeError::ForeignHub`] when it is addressed
    /// to another hub.
    pub fn parse_command<'t>(&self, topic: &'t str) -> Result<(&'t str, &'t str), DecodeError> {
        let malformed = || DecodeError::MalformedTopic(topic.to_string());
        let rest = topic
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix("/blinds/"))
            .and_then(|rest| rest.strip_suffix("/set"))
            .ok_or_else(malformed)?;
        let (hub_id, identifier) = rest.split_once('/').ok_or_else(malformed)?;
        if identifier.contains('/') {
            return Err(malformed());
        }
        if hub_id != self.hub_id {
            return Err(DecodeError::ForeignHub(hub_id.to_string()));
        }
        identifier.rsplit_once('_').ok_or_else(malformed)
    }
}

/// Turns inbound MQTT messages into blind commands.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    topics: Topics,
    blinds: Vec<Blind>,
}

impl CommandDecoder {
    #[must_use]
    pub fn new(topics: Topics, blinds: Vec<Blind>) -> Self {
        Self { topics, blinds }
    }

    /// Resolve the blind addressed by `topic` and the command in `payload`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] describing why the message was rejected.
    pub fn decode(&self, topic: &str, payload: &[u8]) -> Result<(Blind, BlindCommand), DecodeError> {
        let (kind, address) = self.topics.parse_command(topic)?;
        let unknown = || DecodeError::UnknownBlind(format!("{kind}_{address}"));
        let address: BlindAddress = address.parse().map_err(|_| unknown())?;
        let blind = self
            .blinds
            .iter()
            .find(|b| b.kind == kind && b.address == address)
            .ok_or_else(unknown)?;

        let text = String::from_utf8_lossy(payload);
        let command = text
            .trim()
            .parse::<BlindCommand>()
            .map_err(|_| DecodeError::UnknownPayload(text.to_string()))?;
        Ok((blind.clone(), command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("mediola", "hub1", "homeassistant")
    }

    fn blind(address: &str) -> Blind {
        Blind::builder()
            .address(address)
            .name("Living room")
            .build()
            .unwrap()
    }

    fn decoder() -> CommandDecoder {
        CommandDecoder::new(topics(), vec![blind("5"), blind("12")])
    }

    #[test]
    fn should_format_blind_topics() {
        let topics = topics();
        let blind = blind("5");
        assert_eq!(topics.command(&blind), "mediola/blinds/hub1/ER_5/set");
        assert_eq!(topics.state(&blind), "mediola/blinds/hub1/ER_5/state");
        assert_eq!(
            topics.discovery(&blind),
            "homeassistant/cover/hub1_ER_5/config"
        );
    }

    #[test]
    fn should_parse_own_command_topic() {
        let parsed = topics().parse_command("mediola/blinds/hub1/ER_5/set").unwrap();
        assert_eq!(parsed, ("ER", "5"));
    }

    #[test]
    fn should_reject_state_topic_as_command() {
        let err = topics()
            .parse_command("mediola/blinds/hub1/ER_5/state")
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedTopic(_)));
    }

    #[test]
    fn should_reject_topic_with_extra_levels() {
        let err = topics()
            .parse_command("mediola/blinds/hub1/x/ER_5/set")
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedTopic(_)));
    }

    #[test]
    fn should_reject_command_for_other_hub() {
        let err = topics()
            .parse_command("mediola/blinds/hub2/ER_5/set")
            .unwrap_err();
        assert_eq!(err, DecodeError::ForeignHub("hub2".to_string()));
    }

    #[test]
    fn should_decode_known_blind_and_command() {
        let (blind, command) = decoder()
            .decode("mediola/blinds/hub1/ER_12/set", b"close")
            .unwrap();
        assert_eq!(blind.address.value(), 12);
        assert_eq!(command, BlindCommand::Close);
    }

    #[test]
    fn should_drop_unknown_address() {
        let err = decoder()
            .decode("mediola/blinds/hub1/ER_7/set", b"open")
            .unwrap_err();
        assert_eq!(err, DecodeError::UnknownBlind("ER_7".to_string()));
    }

    #[test]
    fn should_drop_unknown_kind() {
        let err = decoder()
            .decode("mediola/blinds/hub1/RT_5/set", b"open")
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownBlind(_)));
    }

    #[test]
    fn should_drop_unrecognised_payload() {
        let err = decoder()
            .decode("mediola/blinds/hub1/ER_5/set", b"toggle")
            .unwrap_err();
        assert_eq!(err, DecodeError::UnknownPayload("toggle".to_string()));
    }

    #[test]
    fn should_tolerate_trailing_newline_in_payload() {
        let (_, command) = decoder()
            .decode("mediola/blinds/hub1/ER_5/set", b"stop\n")
            .unwrap();
        assert_eq!(command, BlindCommand::Stop);
    }
}
