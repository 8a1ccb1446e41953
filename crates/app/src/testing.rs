//! In-memory fakes of the ports, shared by the service tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

use crate::ports::{BlindHub, StatePublisher};

// ── Scripted hub ───────────────────────────────────────────────

/// Hub that answers state requests from a script and records commands.
///
/// Once the script is exhausted the last scripted state is repeated.
pub(crate) struct ScriptedHub {
    script: Mutex<VecDeque<BlindState>>,
    last: Mutex<BlindState>,
    commands: Mutex<Vec<(u32, BlindCommand)>>,
    state_requests: Mutex<usize>,
    failing_commands: Mutex<usize>,
    failing_polls: Mutex<usize>,
}

impl ScriptedHub {
    pub(crate) fn with(states: &[BlindState]) -> Self {
        Self {
            script: Mutex::new(states.iter().copied().collect()),
            last: Mutex::new(BlindState::Unknown),
            commands: Mutex::new(Vec::new()),
            state_requests: Mutex::new(0),
            failing_commands: Mutex::new(0),
            failing_polls: Mutex::new(0),
        }
    }

    /// Make the next `count` command sends fail as if the hub were offline.
    pub(crate) fn fail_next_commands(&self, count: usize) {
        *self.failing_commands.lock().unwrap() = count;
    }

    /// Make the next `count` state requests fail as if the hub were offline.
    pub(crate) fn fail_next_polls(&self, count: usize) {
        *self.failing_polls.lock().unwrap() = count;
    }

    pub(crate) fn commands(&self) -> Vec<BlindCommand> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| *command)
            .collect()
    }

    pub(crate) fn state_requests(&self) -> usize {
        *self.state_requests.lock().unwrap()
    }
}

fn offline() -> BridgeError {
    BridgeError::Hub(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "hub offline",
    )))
}

fn take_failure(counter: &Mutex<usize>) -> bool {
    let mut remaining = counter.lock().unwrap();
    if *remaining > 0 {
        *remaining -= 1;
        true
    } else {
        false
    }
}

impl BlindHub for ScriptedHub {
    fn request_state(
        &self,
        _blind: &Blind,
    ) -> impl Future<Output = Result<BlindState, BridgeError>> + Send {
        *self.state_requests.lock().unwrap() += 1;
        let result = if take_failure(&self.failing_polls) {
            Err(offline())
        } else {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            Ok(*last)
        };
        async { result }
    }

    fn send_command(
        &self,
        blind: &Blind,
        command: BlindCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = if take_failure(&self.failing_commands) {
            Err(offline())
        } else {
            self.commands
                .lock()
                .unwrap()
                .push((blind.address.value(), command));
            Ok(())
        };
        async { result }
    }
}

// ── Recording publisher ────────────────────────────────────────

/// Publisher that records every state once its publish returns.
///
/// Publishes of one chosen state can be slowed down, like a broker whose
/// request queue is full.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    published: Mutex<Vec<(String, BlindState)>>,
    slow: Option<(BlindState, Duration)>,
}

impl RecordingPublisher {
    pub(crate) fn slow_on(state: BlindState, delay: Duration) -> Self {
        Self {
            slow: Some((state, delay)),
            ..Self::default()
        }
    }

    pub(crate) fn states(&self) -> Vec<BlindState> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, state)| *state)
            .collect()
    }
}

impl StatePublisher for RecordingPublisher {
    fn publish_state(
        &self,
        blind: &Blind,
        state: BlindState,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let delay = self
            .slow
            .filter(|(slow, _)| *slow == state)
            .map(|(_, delay)| delay);
        let identifier = blind.identifier();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.published.lock().unwrap().push((identifier, state));
            Ok(())
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────

pub(crate) fn blind(address: &str) -> Blind {
    Blind::builder()
        .address(address)
        .name("Test blind")
        .build()
        .unwrap()
}
