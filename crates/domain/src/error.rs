//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! when crossing a port boundary.

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A value violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The hub could not be reached or answered with a failure status.
    #[error("hub error")]
    Hub(#[source] BoxedError),

    /// The message bus rejected an operation.
    #[error("bus error")]
    Bus(#[source] BoxedError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A blind address was empty or not a number.
    #[error("invalid blind address {0:?}")]
    InvalidAddress(String),

    /// A blind was configured without a display name.
    #[error("blind name must not be empty")]
    EmptyName,

    /// A command payload was not one of `open`, `close`, `stop`.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_bridge_error() {
        let err: BridgeError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            BridgeError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_invalid_address() {
        let err = ValidationError::InvalidAddress("zz".to_string());
        assert_eq!(err.to_string(), "invalid blind address \"zz\"");
    }
}
