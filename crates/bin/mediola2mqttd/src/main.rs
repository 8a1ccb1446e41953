//! # mediola2mqttd: Mediola to MQTT bridge daemon
//!
//! Composition root that wires the hub client and the MQTT bridge together.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Construct the Mediola hub client and the MQTT bridge (adapters)
//! - Construct the state poller and motion controller, injecting adapters via
//!   port traits
//! - Forward decoded bus commands to the motion controller
//! - Stop on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use mediola2mqtt_adapter_mediola::MediolaClient;
use mediola2mqtt_adapter_mqtt::{CommandRequest, MqttBridge, MqttStatePublisher};
use mediola2mqtt_app::services::motion_controller::MotionController;
use mediola2mqtt_app::services::state_poller::StatePoller;
use mediola2mqtt_app::session::SessionRegistry;

use crate::config::Config;

/// Decoded commands waiting for the dispatcher.
const COMMAND_QUEUE: usize = 32;

type Controller = MotionController<MediolaClient, MqttStatePublisher>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let blinds = config.blinds()?;
    if blinds.is_empty() {
        tracing::warn!("no blinds configured, commands will be ignored");
    }

    // Hub
    let hub = Arc::new(MediolaClient::new(config.mediola.clone())?);

    // Bus
    let (bridge, publisher) = MqttBridge::new(
        &config.mqtt,
        &config.mediola.hub_id,
        &config.mediola.host,
        blinds,
    );

    // Motion engine
    let poller = Arc::new(StatePoller::new(
        Arc::clone(&hub),
        Arc::new(publisher),
        config.mediola.follow_up_interval(),
    ));
    let controller = MotionController::new(
        hub,
        poller,
        Arc::new(SessionRegistry::new()),
        config.motion_config(),
    );

    tracing::info!(
        hub = %config.mediola.host,
        broker = %config.mqtt.broker_host,
        port = config.mqtt.broker_port,
        blinds = config.blinds.len(),
        "mediola2mqttd starting"
    );

    let (commands, queue) = mpsc::channel(COMMAND_QUEUE);
    tokio::select! {
        () = bridge.run(commands) => tracing::warn!("MQTT bridge stopped"),
        () = dispatch(controller, queue) => tracing::warn!("command dispatcher stopped"),
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

/// Start a motion session for every decoded command.
async fn dispatch(controller: Controller, mut queue: mpsc::Receiver<CommandRequest>) {
    while let Some((blind, command)) = queue.recv().await {
        // Sessions log their own outcome.
        drop(controller.move_blind(blind, command));
    }
}
