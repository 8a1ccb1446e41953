//! Blind state: the last condition observed on the hub.

use serde::{Deserialize, Serialize};

/// Discrete condition of a blind as reported by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlindState {
    Opened,
    Closed,
    Opening,
    Closing,
    Stopped,
    #[default]
    Unknown,
}

impl BlindState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Opened,
        Self::Closed,
        Self::Opening,
        Self::Closing,
        Self::Stopped,
        Self::Unknown,
    ];

    /// Whether the blind is in transit ([`Opening`](Self::Opening) or
    /// [`Closing`](Self::Closing)).
    #[must_use]
    pub fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Stable text published on the state topic.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BlindState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}
