//! Generic single-flight refresh engine.
//!
//! An [`UpdateCoordinator`] owns one [`RefreshSource`] and the last
//! snapshot it produced. Refreshes are triggered by a fixed-interval timer
//! or on demand; a refresh already in flight satisfies every concurrent
//! request instead of starting another one.
//!
//! Snapshots are published whole through a `watch` channel and never
//! mutated afterwards, so readers need no locking.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::config::ScanInterval;
use crate::datamall::TransitError;

/// Deadline for one whole refresh, including every fanned-out request.
pub const REFRESH_DEADLINE: Duration = Duration::from_secs(10);

/// Why a refresh did not publish a snapshot.
///
/// This is the only classification the host sees: fatal failures need a
/// new credential, everything else is retried on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// The credential was rejected.
    #[error("needs re-authentication: {0}")]
    NeedsReauth(String),

    /// An API, transport or decoding failure.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// The refresh did not finish before the deadline.
    #[error("update failed: timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl UpdateError {
    /// Returns true if polling should stop until the credential is replaced.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UpdateError::NeedsReauth(_))
    }
}

impl From<TransitError> for UpdateError {
    fn from(err: TransitError) -> Self {
        if err.is_authentication() {
            UpdateError::NeedsReauth(err.to_string())
        } else {
            UpdateError::UpdateFailed(err.to_string())
        }
    }
}

/// Produces a fresh snapshot on each refresh.
pub trait RefreshSource: Send + Sync + 'static {
    /// The snapshot type.
    type Data: Send + Sync + 'static;

    /// Name used in logs.
    const NAME: &'static str;

    /// Fetch a complete new snapshot.
    fn fetch(&self) -> impl Future<Output = Result<Self::Data, TransitError>> + Send;
}

/// Phase of the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Refreshing,
}

/// What subscribers observe.
#[derive(Debug)]
pub struct UpdateState<T> {
    /// Last successfully published snapshot. Kept across failures.
    pub data: Option<Arc<T>>,
    /// When `data` was published.
    pub last_updated: Option<DateTime<Utc>>,
    pub phase: UpdatePhase,
    /// Failure of the most recent refresh, cleared by the next success.
    pub last_error: Option<UpdateError>,
}

impl<T> UpdateState<T> {
    /// Returns true if the most recent refresh published a snapshot.
    pub fn last_update_success(&self) -> bool {
        self.data.is_some() && self.last_error.is_none()
    }

    /// Returns true if the most recent refresh failed authentication.
    pub fn needs_reauth(&self) -> bool {
        self.last_error.as_ref().is_some_and(UpdateError::is_fatal)
    }
}

impl<T> Default for UpdateState<T> {
    fn default() -> Self {
        Self {
            data: None,
            last_updated: None,
            phase: UpdatePhase::Idle,
            last_error: None,
        }
    }
}

impl<T> Clone for UpdateState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            last_updated: self.last_updated,
            phase: self.phase,
            last_error: self.last_error.clone(),
        }
    }
}

type RefreshResult<T> = Result<Arc<T>, UpdateError>;
type InFlight<T> = Shared<BoxFuture<'static, RefreshResult<T>>>;

struct Inner<S: RefreshSource> {
    source: S,
    interval: Duration,
    deadline: Duration,
    state: watch::Sender<UpdateState<S::Data>>,
    in_flight: Mutex<Option<InFlight<S::Data>>>,
}

/// Periodic, single-flight refresh of one [`RefreshSource`].
pub struct UpdateCoordinator<S: RefreshSource> {
    inner: Arc<Inner<S>>,
}

impl<S: RefreshSource> Clone for UpdateCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: RefreshSource> UpdateCoordinator<S> {
    /// Create a coordinator polling every `interval`, with the default deadline.
    pub fn new(source: S, interval: ScanInterval) -> Self {
        Self::with_deadline(source, interval, REFRESH_DEADLINE)
    }

    /// Create a coordinator with a custom refresh deadline.
    pub fn with_deadline(source: S, interval: ScanInterval, deadline: Duration) -> Self {
        let (state, _) = watch::channel(UpdateState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                interval: interval.as_duration(),
                deadline,
                state,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// The refresh source.
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Polling interval.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Current state.
    pub fn state(&self) -> UpdateState<S::Data> {
        self.inner.state.borrow().clone()
    }

    /// Last published snapshot, if any.
    pub fn data(&self) -> Option<Arc<S::Data>> {
        self.inner.state.borrow().data.clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<UpdateState<S::Data>> {
        self.inner.state.subscribe()
    }

    /// Refresh now, or join the refresh already in flight.
    ///
    /// Must be called from within a Tokio runtime. The refresh runs as its
    /// own task, so dropping the returned future does not cancel it.
    pub async fn request_refresh(&self) -> RefreshResult<S::Data> {
        let refresh = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match in_flight.as_ref() {
                Some(refresh) => {
                    debug!(coordinator = S::NAME, "Joining refresh in flight");
                    refresh.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let task = tokio::spawn(Self::run(inner.clone()));
                    let refresh = async move {
                        match task.await {
                            Ok(result) => result,
                            Err(e) => {
                                // `run` never got to clear the slot or publish
                                let err =
                                    UpdateError::UpdateFailed(format!("refresh task aborted: {e}"));
                                Self::finish(&inner, &Err(err.clone()));
                                Err(err)
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    *in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Start the fixed-interval timer. The first refresh happens immediately.
    ///
    /// Polling stops by itself after a fatal failure; explicit refreshes
    /// remain possible.
    pub fn start_polling(&self) -> PollingHandle {
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(coordinator.inner.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = coordinator.request_refresh().await
                    && e.is_fatal()
                {
                    error!(
                        coordinator = S::NAME,
                        "Polling suspended until the credential is replaced"
                    );
                    break;
                }
            }
        });

        PollingHandle { task }
    }

    async fn run(inner: Arc<Inner<S>>) -> RefreshResult<S::Data> {
        inner
            .state
            .send_modify(|state| state.phase = UpdatePhase::Refreshing);

        let result = match tokio::time::timeout(inner.deadline, inner.source.fetch()).await {
            Ok(Ok(data)) => Ok(Arc::new(data)),
            Ok(Err(e)) => Err(UpdateError::from(e)),
            Err(_) => Err(UpdateError::Timeout(inner.deadline)),
        };

        Self::finish(&inner, &result);
        result
    }

    /// Clear the in-flight slot, then publish the outcome.
    fn finish(inner: &Inner<S>, result: &RefreshResult<S::Data>) {
        // Later requests start a new refresh
        inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match result {
            Ok(_) => debug!(coordinator = S::NAME, "Published new snapshot"),
            Err(e) if e.is_fatal() => error!(coordinator = S::NAME, error = %e, "Refresh failed"),
            Err(e) => warn!(coordinator = S::NAME, error = %e, "Refresh failed, retrying next tick"),
        }

        inner.state.send_modify(|state| {
            state.phase = UpdatePhase::Idle;
            match result {
                Ok(data) => {
                    state.data = Some(data.clone());
                    state.last_updated = Some(Utc::now());
                    state.last_error = None;
                }
                Err(e) => state.last_error = Some(e.clone()),
            }
        });
    }
}

/// Running poll timer. Dropping the handle stops polling.
///
/// A refresh already in flight is left to finish on its own.
#[derive(Debug)]
pub struct PollingHandle {
    task: JoinHandle<()>,
}

impl PollingHandle {
    /// Stop polling.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Returns true once the timer has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
