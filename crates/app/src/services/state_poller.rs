//! State poller: reads a blind's state, mirrors it to the bus and keeps
//! following the blind while it travels.
//!
//! Every poll of a blind, from a motion loop or from a follow-up, holds that
//! blind's gate from the hub request until the publish returns. Publishes for
//! one blind therefore leave in the order the polls completed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mediola2mqtt_domain::blind::{Blind, BlindAddress};
use mediola2mqtt_domain::error::BridgeError;
use mediola2mqtt_domain::state::BlindState;

use crate::ports::{BlindHub, StatePublisher};
use crate::session::SessionToken;

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Polls blind states and publishes every observation.
pub struct StatePoller<H, P> {
    hub: Arc<H>,
    publisher: Arc<P>,
    follow_up_interval: Duration,
    gates: Mutex<HashMap<BlindAddress, Gate>>,
}

impl<H, P> StatePoller<H, P>
where
    H: BlindHub + 'static,
    P: StatePublisher + 'static,
{
    /// Create a poller that re-checks moving blinds every `follow_up_interval`.
    pub fn new(hub: Arc<H>, publisher: Arc<P>, follow_up_interval: Duration) -> Self {
        Self {
            hub,
            publisher,
            follow_up_interval,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Read the state of `blind`, publish it and return it.
    ///
    /// When `follow_up_if_moving` is set and the blind is travelling, exactly
    /// one follow-up poll is scheduled after the follow-up interval. The
    /// follow-up belongs to `session` and is skipped once the session is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Hub`] when the hub cannot be reached. Publish
    /// failures are logged, not returned.
    pub async fn poll_and_publish(
        &self,
        blind: &Blind,
        follow_up_if_moving: bool,
        session: &SessionToken,
    ) -> Result<BlindState, BridgeError> {
        let gate = self.gate(&blind.address);
        let _serial = gate.lock().await;
        let state = read_and_publish(&*self.hub, &*self.publisher, blind).await?;
        if follow_up_if_moving && state.is_moving() {
            self.schedule_follow_up(blind, session, Arc::clone(&gate));
        }
        Ok(state)
    }

    fn gate(&self, address: &BlindAddress) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(address.clone()).or_default())
    }

    fn schedule_follow_up(&self, blind: &Blind, session: &SessionToken, gate: Gate) {
        tracing::debug!(
            address = %blind.address,
            interval_secs = self.follow_up_interval.as_secs_f64(),
            "scheduling follow-up poll"
        );
        session.follow_up_started();
        let chain = FollowUp {
            hub: Arc::clone(&self.hub),
            publisher: Arc::clone(&self.publisher),
            interval: self.follow_up_interval,
            blind: blind.clone(),
            session: session.clone(),
            gate,
        };
        tokio::spawn(async move {
            chain.run().await;
            chain.session.follow_up_ended();
        });
    }
}

async fn read_and_publish<H: BlindHub, P: StatePublisher>(
    hub: &H,
    publisher: &P,
    blind: &Blind,
) -> Result<BlindState, BridgeError> {
    let state = hub.request_state(blind).await?;
    tracing::debug!(address = %blind.address, %state, "observed blind state");
    if let Err(err) = publisher.publish_state(blind, state).await {
        tracing::warn!(address = %blind.address, %state, %err, "failed to publish blind state");
    }
    Ok(state)
}

/// Deferred re-polls of a travelling blind.
///
/// Each poll that still sees the blind moving schedules the next one, one
/// interval later, until the blind stops moving or the session is cancelled.
struct FollowUp<H, P> {
    hub: Arc<H>,
    publisher: Arc<P>,
    interval: Duration,
    blind: Blind,
    session: SessionToken,
    gate: Gate,
}

impl<H: BlindHub, P: StatePublisher> FollowUp<H, P> {
    async fn run(&self) {
        loop {
            tokio::select! {
                biased;
                () = self.session.cancelled() => {
                    tracing::debug!(address = %self.blind.address, "follow-up poll cancelled");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {}
            }

            let _serial = self.gate.lock().await;
            if self.session.is_cancelled() {
                tracing::debug!(address = %self.blind.address, "follow-up poll cancelled");
                return;
            }
            match read_and_publish(&*self.hub, &*self.publisher, &self.blind).await {
                Ok(state) if state.is_moving() => {}
                Ok(_) => return,
                Err(err) => {
                    tracing::warn!(address = %self.blind.address, %err, "follow-up poll failed");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingPublisher, ScriptedHub, blind};

    fn poller(
        hub: &Arc<ScriptedHub>,
        publisher: &Arc<RecordingPublisher>,
    ) -> StatePoller<ScriptedHub, RecordingPublisher> {
        StatePoller::new(
            Arc::clone(hub),
            Arc::clone(publisher),
            Duration::from_secs(2),
        )
    }

    async fn advance(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_and_return_polled_state() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Closed]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        let state = poller
            .poll_and_publish(&blind("5"), true, &SessionToken::detached())
            .await
            .unwrap();

        assert_eq!(state, BlindState::Closed);
        assert_eq!(publisher.states(), vec![BlindState::Closed]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_schedule_exactly_one_follow_up_after_interval_when_opening() {
        let hub = Arc::new(ScriptedHub::with(&[
            BlindState::Opening,
            BlindState::Opened,
        ]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        poller
            .poll_and_publish(&blind("5"), true, &SessionToken::detached())
            .await
            .unwrap();

        advance(1_900).await;
        assert_eq!(hub.state_requests(), 1);

        advance(200).await;
        assert_eq!(hub.state_requests(), 2);

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 2);
        assert_eq!(
            publisher.states(),
            vec![BlindState::Opening, BlindState::Opened]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_schedule_follow_up_when_opened() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Opened]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        poller
            .poll_and_publish(&blind("5"), true, &SessionToken::detached())
            .await
            .unwrap();

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_schedule_follow_up_when_disabled() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Closing]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        poller
            .poll_and_publish(&blind("5"), false, &SessionToken::detached())
            .await
            .unwrap();

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_following_until_blind_stops_moving() {
        let hub = Arc::new(ScriptedHub::with(&[
            BlindState::Closing,
            BlindState::Closing,
            BlindState::Closing,
            BlindState::Closed,
        ]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        poller
            .poll_and_publish(&blind("5"), true, &SessionToken::detached())
            .await
            .unwrap();

        advance(60_000).await;
        assert_eq!(hub.state_requests(), 4);
        assert_eq!(
            publisher.states(),
            vec![
                BlindState::Closing,
                BlindState::Closing,
                BlindState::Closing,
                BlindState::Closed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_follow_up_once_session_is_cancelled() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Opening]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);
        let session = SessionToken::detached();

        poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();
        session.cancel();

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 1);
        assert_eq!(publisher.states(), vec![BlindState::Opening]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_schedule_follow_up_for_every_moving_poll() {
        let hub = Arc::new(ScriptedHub::with(&[
            BlindState::Opening,
            BlindState::Opening,
            BlindState::Opened,
        ]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);
        let session = SessionToken::detached();

        poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();
        poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();
        assert_eq!(session.pending_follow_ups(), 2);

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 4);
        assert_eq!(session.pending_follow_ups(), 0);
        assert_eq!(
            publisher.states(),
            vec![
                BlindState::Opening,
                BlindState::Opening,
                BlindState::Opened,
                BlindState::Opened,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_in_poll_order_when_publisher_is_slow() {
        let hub = Arc::new(ScriptedHub::with(&[
            BlindState::Closing,
            BlindState::Stopped,
            BlindState::Opening,
            BlindState::Opened,
        ]));
        let publisher = Arc::new(RecordingPublisher::slow_on(
            BlindState::Stopped,
            Duration::from_secs(1),
        ));
        let poller = poller(&hub, &publisher);
        let session = SessionToken::detached();

        poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();

        // The follow-up reads `stopped` at t=2 and holds the blind until its
        // publish returns at t=3; this poll queues behind it.
        advance(2_500).await;
        let state = poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();
        assert_eq!(state, BlindState::Opening);

        advance(30_000).await;
        assert_eq!(
            publisher.states(),
            vec![
                BlindState::Closing,
                BlindState::Stopped,
                BlindState::Opening,
                BlindState::Opened,
            ]
        );
        assert_eq!(hub.state_requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn should_end_follow_up_chain_on_hub_error() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Opening]));
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);
        let session = SessionToken::detached();

        poller
            .poll_and_publish(&blind("5"), true, &session)
            .await
            .unwrap();
        hub.fail_next_polls(1);

        advance(30_000).await;
        assert_eq!(hub.state_requests(), 2);
        assert_eq!(publisher.states(), vec![BlindState::Opening]);
        assert_eq!(session.pending_follow_ups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_hub_error_without_publishing() {
        let hub = Arc::new(ScriptedHub::with(&[BlindState::Opened]));
        hub.fail_next_polls(1);
        let publisher = Arc::new(RecordingPublisher::default());
        let poller = poller(&hub, &publisher);

        let result = poller
            .poll_and_publish(&blind("5"), true, &SessionToken::detached())
            .await;

        assert!(matches!(result, Err(BridgeError::Hub(_))));
        assert!(publisher.states().is_empty());
    }
}
