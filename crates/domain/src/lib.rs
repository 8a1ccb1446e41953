//! # mediola2mqtt-domain
//!
//! Pure domain model for the Mediola blind bridge.
//!
//! ## Responsibilities
//! - Define **Blinds** (hub-addressed devices loaded from configuration)
//! - Define **Commands** (`open`, `close`, `stop`) and which observed states
//!   satisfy each of them
//! - Define **States** observed on the hub and their wire text
//! - Error conventions shared by every layer
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod blind;
pub mod command;
pub mod error;
pub mod state;
