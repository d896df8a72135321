//! Single-flight access token refresh
//!
//! When a request is rejected with 401, the first task to notice becomes
//! the refresh leader and receives a [`RefreshLease`]. Every task that
//! hits a 401 while the lease is outstanding is queued and parked on a
//! oneshot channel until the leader settles the lease. Settling releases
//! the queue in insertion order and returns the coordinator to `Idle`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

/// Whether a refresh call is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Result delivered to queued requests: the new access token or the
/// reason the refresh failed
pub type RefreshOutcome = std::result::Result<String, String>;

type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Debug)]
struct Inner {
    state: RefreshState,
    queue: Vec<Waiter>,
}

/// Shared refresh state machine, one per API client
///
/// The lock is never held across an await, so a lease can always settle
/// synchronously, including from `Drop`.
#[derive(Debug)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

/// What a failing request should do next
#[derive(Debug)]
pub enum Admission<'a> {
    /// Perform the refresh and settle the lease
    Leader(RefreshLease<'a>),
    /// Wait for the in-flight refresh to settle
    Queued(oneshot::Receiver<RefreshOutcome>),
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RefreshState::Idle,
                queue: Vec::new(),
            }),
        }
    }

    pub async fn state(&self) -> RefreshState {
        self.lock().state
    }

    /// Number of requests parked behind the in-flight refresh
    pub async fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Either start a refresh or join the queue of the one in flight
    ///
    /// The check and the transition happen under one lock, so exactly one
    /// caller becomes leader per refresh cycle.
    pub async fn admit(&self) -> Admission<'_> {
        let mut inner = self.lock();
        match inner.state {
            RefreshState::Refreshing => {
                let (tx, rx) = oneshot::channel();
                inner.queue.push(tx);
                debug!("Refresh in flight, queued request ({} waiting)", inner.queue.len());
                Admission::Queued(rx)
            }
            RefreshState::Idle => {
                inner.state = RefreshState::Refreshing;
                debug!("Starting token refresh");
                Admission::Leader(RefreshLease {
                    coordinator: self,
                    settled: false,
                })
            }
        }
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut inner = self.lock();
            inner.state = RefreshState::Idle;
            std::mem::take(&mut inner.queue)
        };
        debug!(
            "Refresh settled ({}), releasing {} queued requests",
            if outcome.is_ok() { "ok" } else { "failed" },
            waiters.len()
        );
        for waiter in waiters {
            // A dropped receiver means the queued request was cancelled
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that the holder is the single refresh leader
///
/// Must be settled with [`RefreshLease::succeed`] or [`RefreshLease::fail`].
/// Dropping an unsettled lease (for instance when the leader's future is
/// cancelled) fails every queued request and returns to `Idle`.
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Release the queue with the new access token
    pub async fn succeed(mut self, access_token: &str) {
        self.settled = true;
        self.coordinator.settle(Ok(access_token.to_string()));
    }

    /// Fail every queued request
    pub async fn fail(mut self, reason: &str) {
        self.settled = true;
        self.coordinator.settle(Err(reason.to_string()));
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Token refresh abandoned, failing queued requests");
            self.coordinator
                .settle(Err("token refresh was abandoned".to_string()));
        }
    }
}
