//! Blind command: the intent carried by an inbound request.

use std::str::FromStr;

use crate::error::ValidationError;
use crate::state::BlindState;

/// What a caller wants a blind to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlindCommand {
    Open,
    Close,
    Stop,
}

impl BlindCommand {
    /// Observed states that count as the command having taken effect.
    ///
    /// A blind that is already travelling in the requested direction is
    /// accepted, the hub keeps driving it to the end position on its own.
    #[must_use]
    pub fn success_states(self) -> &'static [BlindState] {
        match self {
            Self::Open => &[BlindState::Opening, BlindState::Opened],
            Self::Close => &[BlindState::Closing, BlindState::Closed],
            Self::Stop => &[BlindState::Stopped],
        }
    }

    /// Whether `state` satisfies this command.
    #[must_use]
    pub fn is_satisfied_by(self, state: BlindState) -> bool {
        self.success_states().contains(&state)
    }

    /// Payload text used on the command topic.
    #[must_use]
    pub fn as_payload(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        }
    }
}

impl std::fmt::Display for BlindCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_payload())
    }
}

impl FromStr for BlindCommand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "stop" => Ok(Self::Stop),
            other => Err(ValidationError::UnknownCommand(other.to_string())),
        }
    }
}
