//! # mediola2mqtt-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `BlindHub`: read blind states and send move commands to the hub
//!   - `StatePublisher`: mirror observed states to the message bus
//! - Provide the **motion engine**:
//!   - `StatePoller`: poll, publish, and follow travelling blinds
//!   - `MotionController`: drive a blind until a command takes effect,
//!     superseding stale commands for the same blind
//! - Own the per-blind **session registry** used for cancellation
//!
//! ## Dependency rule
//! Depends on `mediola2mqtt-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
