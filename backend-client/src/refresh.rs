//! Single-flight coordination of access-token renewal.
//!
//! The first caller that needs a new token becomes the leader and performs the
//! refresh; every caller arriving while that refresh is in flight is parked on
//! a one-shot channel and woken with the leader's outcome. The state returns
//! to idle on every exit path, including cancellation of the leader.

use std::future::Future;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use thiserror::Error;
use tokio::sync::oneshot;

/// Why a token refresh did not produce a new access token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct RefreshFailed {
    reason: String,
    abandoned: bool,
}

impl RefreshFailed {
    /// The backend (or the missing refresh token) rejected the renewal.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            abandoned: false,
        }
    }

    /// The refresh never finished; the session itself may still be valid.
    pub fn abandoned(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            abandoned: true,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }
}

pub type RefreshOutcome = Result<String, RefreshFailed>;

/// A caller suspended until the in-flight refresh settles. The request it
/// will replay stays with the suspended caller; only the completion signal
/// lives here.
#[derive(Debug)]
struct PendingRefreshWaiter {
    notify: oneshot::Sender<RefreshOutcome>,
}

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<PendingRefreshWaiter>,
    },
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Number of callers currently parked behind the in-flight refresh.
    pub fn waiting(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Runs `refresh` unless another caller is already refreshing, in which
    /// case this waits for that caller's outcome instead. Either way every
    /// participant observes the same outcome.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        match self.join() {
            Role::Follower(outcome) => outcome
                .await
                .unwrap_or_else(|_| Err(RefreshFailed::abandoned("token refresh was abandoned"))),
            Role::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    outcome: None,
                };
                let outcome = refresh().await;
                guard.outcome = Some(outcome.clone());
                drop(guard);
                outcome
            }
        }
    }

    fn join(&self) -> Role {
        let mut state = self.lock_state();
        match &mut *state {
            RefreshState::Idle => {
                *state = RefreshState::Refreshing {
                    waiters: Vec::new(),
                };
                tracing::debug!("token refresh started");
                Role::Leader
            }
            RefreshState::Refreshing { waiters } => {
                let (notify, outcome) = oneshot::channel();
                waiters.push(PendingRefreshWaiter { notify });
                tracing::debug!(waiting = waiters.len(), "queued behind token refresh");
                Role::Follower(outcome)
            }
        }
    }

    /// Returns to idle and wakes every parked caller. The queue is taken in
    /// one step so a caller arriving afterwards starts from a clean state.
    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = match std::mem::take(&mut *self.lock_state()) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };
        tracing::debug!(
            succeeded = outcome.is_ok(),
            released = waiters.len(),
            "token refresh finished"
        );
        for waiter in waiters {
            let _ = waiter.notify.send(outcome.clone());
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    outcome: Option<RefreshOutcome>,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(RefreshFailed::abandoned("token refresh was cancelled")));
        self.coordinator.finish(&outcome);
    }
}
