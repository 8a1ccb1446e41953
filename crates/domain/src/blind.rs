//! Blind: one motorised window covering reachable through the hub.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ValidationError;

/// Vendor device type used when a blind does not specify one.
pub const DEFAULT_KIND: &str = "ER";

/// Hub-local address of a blind.
///
/// Configured either as a decimal number (`"5"`) or with a `0x` prefix
/// (`"0x05"`). Two addresses are equal when they denote the same number,
/// whatever their spelling; [`Display`](fmt::Display) keeps the configured
/// spelling because it is part of the MQTT topic.
#[derive(Debug, Clone)]
pub struct BlindAddress {
    raw: String,
    value: u32,
}

impl BlindAddress {
    /// Numeric value of the address.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Lower-case hex rendering expected by the hub (at least two digits).
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02x}", self.value)
    }
}

impl FromStr for BlindAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parsed = match raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => raw.parse::<u32>(),
        };
        let value = parsed.map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }
}

impl PartialEq for BlindAddress {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for BlindAddress {}

impl Hash for BlindAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for BlindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A blind loaded from configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blind {
    /// Hub-local address.
    pub address: BlindAddress,
    /// Display label.
    pub name: String,
    /// Vendor device type (`ER` for Elero blinds).
    pub kind: String,
}

impl Blind {
    /// Start building a blind.
    #[must_use]
    pub fn builder() -> BlindBuilder {
        BlindBuilder::default()
    }

    /// Identifier used in topics and discovery ids, e.g. `ER_5`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}_{}", self.kind, self.address)
    }
}

/// Builder for [`Blind`] that validates on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct BlindBuilder {
    address: Option<String>,
    name: Option<String>,
    kind: Option<String>,
}

impl BlindBuilder {
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Validate and build the blind.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] if the address is missing or
    /// not a number, and [`ValidationError::EmptyName`] if the name is blank.
    pub fn build(self) -> Result<Blind, ValidationError> {
        let address = self.address.unwrap_or_default().parse()?;
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let kind = self
            .kind
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_KIND.to_string());
        Ok(Blind {
            address,
            name,
            kind,
        })
    }
}
