//! Motion sessions: per-blind cancellation shared by a motion loop and its
//! follow-up polls.
//!
//! [`SessionRegistry`] hands out one [`SessionToken`] per blind address.
//! Beginning a new session cancels the previous token for the same address
//! under the registry lock, so at most one non-cancelled session exists per
//! blind at any time.
//!
//! A session stays registered while its motion loop runs or while a follow-up
//! poll is pending, so a newer command also cancels the follow-ups of a
//! session that already reached its target.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use mediola2mqtt_domain::blind::BlindAddress;

/// Cancellation handle for one motion session.
///
/// Cloning is cheap; every clone observes the same cancellation and the same
/// count of pending follow-up chains.
#[derive(Debug, Clone)]
pub struct SessionToken {
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    follow_ups: Arc<AtomicUsize>,
}

impl SessionToken {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(true)),
            follow_ups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A token that belongs to no registry and is only cancelled explicitly.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::new()
    }

    /// Whether the session has been superseded.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the session is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Cancel the session and everything scheduled under it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Record a follow-up chain scheduled under this session.
    pub(crate) fn follow_up_started(&self) {
        self.follow_ups.fetch_add(1, Ordering::AcqRel);
    }

    /// Record the end of a chain started with [`Self::follow_up_started`].
    pub(crate) fn follow_up_ended(&self) {
        self.follow_ups.fetch_sub(1, Ordering::AcqRel);
    }

    /// Number of follow-up chains still pending.
    pub(crate) fn pending_follow_ups(&self) -> usize {
        self.follow_ups.load(Ordering::Acquire)
    }

    /// Not cancelled, and either the loop or a follow-up chain still runs.
    fn is_live(&self) -> bool {
        !self.is_cancelled()
            && (self.running.load(Ordering::Acquire) || self.pending_follow_ups() > 0)
    }
}

/// Owned map from blind address to its current session token.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<HashMap<BlindAddress, SessionToken>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session for `address`, cancelling the one it supersedes.
    ///
    /// Cancellation is fire-and-forget: the superseded loop and its follow-up
    /// polls notice it at their next check point.
    pub fn begin(&self, address: &BlindAddress) -> SessionToken {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|_, entry| entry.is_live());
        let token = SessionToken::new();
        if let Some(previous) = active.insert(address.clone(), token.clone()) {
            previous.cancel();
            tracing::debug!(%address, "superseded motion session");
        }
        token
    }

    /// Mark the motion loop behind `token` as done.
    ///
    /// The entry is dropped right away unless a follow-up poll is still
    /// pending, in which case it lingers until the chain ends. A newer session
    /// for the same address is left untouched.
    pub fn finish(&self, token: &SessionToken) {
        token.running.store(false, Ordering::Release);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|_, entry| entry.is_live());
    }

    /// Whether a live session is registered for `address`.
    #[must_use]
    pub fn is_active(&self, address: &BlindAddress) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.get(address).is_some_and(SessionToken::is_live)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.values().filter(|token| token.is_live()).count()
    }

    /// Whether no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
