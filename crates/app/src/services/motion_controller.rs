//! Motion controller: drives a blind until the hub reports that a command
//! took effect.
//!
//! Each [`MotionController::move_blind`] call starts a motion session on its
//! own task:
//!
//! 1. send the command to the hub
//! 2. wait [`MotionConfig::command_delay`]
//! 3. poll (and publish) the state, with follow-up polling enabled
//! 4. stop if the state satisfies the command, otherwise go back to 1
//!
//! A newer command for the same blind cancels the running session. The check
//! is cooperative: it happens at the top of every iteration and before every
//! poll, an HTTP request already in flight is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use mediola2mqtt_domain::blind::Blind;
use mediola2mqtt_domain::command::BlindCommand;
use mediola2mqtt_domain::state::BlindState;

use crate::ports::{BlindHub, StatePublisher};
use crate::services::state_poller::StatePoller;
use crate::session::{SessionRegistry, SessionToken};

/// Tuning knobs for the motion loop.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Pause between sending a command and polling the result.
    pub command_delay: Duration,
    /// Pause after the hub could not be reached, before the next attempt.
    pub transport_error_backoff: Duration,
    /// Give up after this many command sends. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_secs(1),
            transport_error_backoff: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

/// How a motion session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The hub reported a state that satisfies the command.
    Reached(BlindState),
    /// A newer command for the same blind took over.
    Superseded,
    /// `max_attempts` command sends did not produce a success state.
    GaveUp { attempts: u32 },
}

/// Starts and supersedes motion sessions.
pub struct MotionController<H, P> {
    hub: Arc<H>,
    poller: Arc<StatePoller<H, P>>,
    registry: Arc<SessionRegistry>,
    config: MotionConfig,
}

impl<H, P> Clone for MotionController<H, P> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            poller: Arc::clone(&self.poller),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<H, P> MotionController<H, P>
where
    H: BlindHub + 'static,
    P: StatePublisher + 'static,
{
    /// Create a controller that shares `hub` with `poller`.
    pub fn new(
        hub: Arc<H>,
        poller: Arc<StatePoller<H, P>>,
        registry: Arc<SessionRegistry>,
        config: MotionConfig,
    ) -> Self {
        Self {
            hub,
            poller,
            registry,
            config,
        }
    }

    /// Registry of running sessions, keyed by blind address.
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Start driving `blind` towards `command`, superseding any session that
    /// is still running for the same blind.
    ///
    /// Returns immediately; the returned handle resolves when the session
    /// ends. Dropping the handle does not stop the session.
    pub fn move_blind(&self, blind: Blind, command: BlindCommand) -> JoinHandle<MotionOutcome> {
        let session = self.registry.begin(&blind.address);
        tracing::info!(address = %blind.address, name = %blind.name, %command, "moving blind");
        let motion = MotionSession {
            hub: Arc::clone(&self.hub),
            poller: Arc::clone(&self.poller),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            blind,
            command,
            session,
        };
        tokio::spawn(motion.run())
    }
}

struct MotionSession<H, P> {
    hub: Arc<H>,
    poller: Arc<StatePoller<H, P>>,
    registry: Arc<SessionRegistry>,
    config: MotionConfig,
    blind: Blind,
    command: BlindCommand,
    session: SessionToken,
}

impl<H, P> MotionSession<H, P>
where
    H: BlindHub + 'static,
    P: StatePublisher + 'static,
{
    async fn run(self) -> MotionOutcome {
        let outcome = self.drive().await;
        self.registry.finish(&self.session);
        match outcome {
            MotionOutcome::Reached(state) => {
                tracing::info!(address = %self.blind.address, command = %self.command, %state, "blind reached target");
            }
            MotionOutcome::Superseded => {
                tracing::debug!(address = %self.blind.address, command = %self.command, "motion superseded");
            }
            MotionOutcome::GaveUp { attempts } => {
                tracing::warn!(address = %self.blind.address, command = %self.command, attempts, "giving up on blind");
            }
        }
        outcome
    }

    async fn drive(&self) -> MotionOutcome {
        let mut attempts: u32 = 0;
        loop {
            if self.session.is_cancelled() {
                return MotionOutcome::Superseded;
            }
            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                return MotionOutcome::GaveUp { attempts };
            }
            attempts += 1;

            tracing::debug!(address = %self.blind.address, command = %self.command, attempt = attempts, "sending command");
            if let Err(err) = self.hub.send_command(&self.blind, self.command).await {
                tracing::warn!(address = %self.blind.address, %err, "failed to send command");
                if !self.pause(self.config.transport_error_backoff).await {
                    return MotionOutcome::Superseded;
                }
                continue;
            }

            if !self.pause(self.config.command_delay).await || self.session.is_cancelled() {
                return MotionOutcome::Superseded;
            }

            match self
                .poller
                .poll_and_publish(&self.blind, true, &self.session)
                .await
            {
                Ok(state) if self.command.is_satisfied_by(state) => {
                    return MotionOutcome::Reached(state);
                }
                Ok(state) => {
                    tracing::debug!(address = %self.blind.address, %state, "command not effective yet");
                }
                Err(err) => {
                    tracing::warn!(address = %self.blind.address, %err, "failed to poll blind state");
                    if !self.pause(self.config.transport_error_backoff).await {
                        return MotionOutcome::Superseded;
                    }
                }
            }
        }
    }

    /// Sleep for `duration` unless the session is cancelled first.
    ///
    /// Returns `false` when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.session.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}
