//! Single-flight coordination of access-token refreshes.
//!
//! One coordinator exists per [`ApiClient`](super::ApiClient). The first
//! request that fails with an expired token becomes the leader and performs
//! the refresh exchange; requests failing while it runs are parked on a
//! one-shot channel and receive the leader's outcome. The refreshing flag and
//! the wait queue live behind one mutex and are only touched in synchronous
//! sections, so the check-then-set never spans an `.await`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::GymError;

/// New access token on success, the shared refresh error otherwise.
pub type RefreshOutcome = Result<String, GymError>;

#[derive(Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Result of asking the coordinator for a fresh token.
pub enum Ticket<'a> {
    /// No refresh was running; the caller must perform it and settle the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is in flight; wait for its outcome.
    Parked(PendingRefresh),
    /// The bearer token the request carried has already been replaced.
    Renewed(String),
}

#[derive(Default)]
pub struct TokenRefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl TokenRefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the refresh protocol for a request that was rejected while
    /// carrying `sent_with`.
    ///
    /// `current` reads the client's bearer token and is only consulted while
    /// idle: if a completed refresh already replaced the rejected token, the
    /// request can be replayed without starting another exchange. Requests
    /// sent without a bearer token never take that shortcut.
    pub fn join(
        &self,
        sent_with: Option<&str>,
        current: impl FnOnce() -> Option<String>,
    ) -> Ticket<'_> {
        let mut state = self.lock();
        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            tracing::debug!(parked = waiters.len(), "request parked behind token refresh");
            return Ticket::Parked(PendingRefresh { rx });
        }

        if let (Some(sent_with), Some(current)) = (sent_with, current()) {
            if sent_with != current {
                return Ticket::Renewed(current);
            }
        }

        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        Ticket::Leader(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        match &*self.lock() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Return to idle and hand `outcome` to every parked request.
    ///
    /// The queue is detached in the same critical section that clears the
    /// flag, so no request can park after the outcome was decided.
    fn complete(&self, outcome: &RefreshOutcome) -> usize {
        let drained = std::mem::take(&mut *self.lock());
        let waiters = match drained {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };
        let count = waiters.len();
        for waiter in waiters {
            // Receiver gone means the parked caller was cancelled.
            let _ = waiter.send(outcome.clone());
        }
        count
    }

    /// Return to idle without an outcome; parked requests observe a closed
    /// channel and rejoin.
    fn abandon(&self) -> usize {
        match std::mem::take(&mut *self.lock()) {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Leadership over one refresh exchange.
///
/// Dropping the lease without settling it (for example when the leading
/// request is cancelled) releases every parked request so one of them can
/// take over the refresh.
pub struct RefreshLease<'a> {
    coordinator: &'a TokenRefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Publish the outcome; returns how many parked requests received it.
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.complete(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let parked = self.coordinator.abandon();
            tracing::warn!(parked, "token refresh abandoned before completing");
        }
    }
}

/// A parked request's view of the in-flight refresh.
pub struct PendingRefresh {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl PendingRefresh {
    /// The leader's outcome, or `None` if the leader gave up without one.
    pub async fn wait(self) -> Option<RefreshOutcome> {
        self.rx.await.ok()
    }
}
