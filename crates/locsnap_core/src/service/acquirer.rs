//! Location acquisition with cached fallback.
//!
//! # Responsibility
//! - Ask for foreground permission, then race one live fetch against a timer.
//! - Persist live fixes; fall back to the cached row otherwise.
//!
//! # Invariants
//! - Exactly one of {live success, live failure, timeout} decides the outcome.
//! - Permission denial never touches the store.
//! - When the timer wins, the live fetch future is dropped; providers treat
//!   that as cancellation and any later answer is discarded.
//! - Store failures are logged and folded into the outcome, never raised.
//! - Store calls are blocking and run inline on the executor; they are
//!   single-row operations expected to finish quickly.

use crate::model::coordinate::Coordinate;
use crate::platform::LocationProvider;
use crate::repo::location_store::LocationStore;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Time allowed for a live fix before falling back to the cached row.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Why the live fetch did not produce the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    LiveFetchFailed,
    TimedOut,
    /// The platform answered with a coordinate outside WGS84 ranges.
    InvalidFix,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LiveFetchFailed => "live_fetch_failed",
            Self::TimedOut => "timed_out",
            Self::InvalidFix => "invalid_fix",
        }
    }
}

/// Result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquireOutcome {
    /// Fresh reading from the device, already written to the store.
    Live(Coordinate),
    /// Last persisted reading, used because the live fetch did not succeed.
    Cached {
        coordinate: Coordinate,
        reason: FallbackReason,
    },
    PermissionDenied,
    /// No live fix and no usable cached row.
    Unavailable { reason: FallbackReason },
}

impl AcquireOutcome {
    /// Returns the coordinate this outcome carries, if any.
    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            Self::Live(coordinate) | Self::Cached { coordinate, .. } => Some(coordinate),
            Self::PermissionDenied | Self::Unavailable { .. } => None,
        }
    }

    /// Collapses the outcome to "have a coordinate" or "have none".
    pub fn into_coordinate(self) -> Option<Coordinate> {
        match self {
            Self::Live(coordinate) | Self::Cached { coordinate, .. } => Some(coordinate),
            Self::PermissionDenied | Self::Unavailable { .. } => None,
        }
    }
}

/// Races a live location fetch against a timer, backed by the location cache.
pub struct LocationAcquirer<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    timeout: Duration,
}

impl<P, S> LocationAcquirer<P, S>
where
    P: LocationProvider,
    S: LocationStore,
{
    /// Creates an acquirer with the default 3000 ms live-fetch timeout.
    pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
        Self::with_timeout(provider, store, DEFAULT_ACQUIRE_TIMEOUT)
    }

    pub fn with_timeout(provider: Arc<P>, store: Arc<S>, timeout: Duration) -> Self {
        Self {
            provider,
            store,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one acquisition: permission check, live/timer race, fallback.
    ///
    /// # Side effects
    /// - Writes a successful live fix to the store.
    /// - Emits `location_acquire` logging events.
    pub async fn acquire(&self) -> AcquireOutcome {
        let started_at = Instant::now();

        let permission = self.provider.request_foreground_permission().await;
        if !permission.is_granted() {
            info!(
                "event=location_acquire module=acquirer status=denied permission={}",
                permission.as_str()
            );
            return AcquireOutcome::PermissionDenied;
        }

        let reason = match timeout(self.timeout, self.provider.current_position()).await {
            Ok(Ok(position)) => match Coordinate::new(position.latitude, position.longitude) {
                Ok(coordinate) => {
                    self.persist(&coordinate);
                    info!(
                        "event=location_acquire module=acquirer status=ok source=live duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                    return AcquireOutcome::Live(coordinate);
                }
                Err(err) => {
                    warn!("event=location_acquire module=acquirer status=invalid_fix error={err}");
                    FallbackReason::InvalidFix
                }
            },
            Ok(Err(err)) => {
                warn!("event=location_acquire module=acquirer status=live_error error={err}");
                FallbackReason::LiveFetchFailed
            }
            Err(_) => {
                info!(
                    "event=location_acquire module=acquirer status=timeout timeout_ms={}",
                    self.timeout.as_millis()
                );
                FallbackReason::TimedOut
            }
        };

        let outcome = self.fallback(reason);
        info!(
            "event=location_acquire module=acquirer status={} source=cache reason={} duration_ms={}",
            if outcome.coordinate().is_some() { "ok" } else { "unavailable" },
            reason.as_str(),
            started_at.elapsed().as_millis()
        );
        outcome
    }

    fn persist(&self, coordinate: &Coordinate) {
        if let Err(err) = self.store.save(coordinate) {
            warn!("event=location_persist module=acquirer status=error error={err}");
        }
    }

    fn fallback(&self, reason: FallbackReason) -> AcquireOutcome {
        match self.store.get_saved() {
            Ok(Some(coordinate)) => AcquireOutcome::Cached { coordinate, reason },
            Ok(None) => AcquireOutcome::Unavailable { reason },
            Err(err) => {
                warn!("event=location_fallback module=acquirer status=error error={err}");
                AcquireOutcome::Unavailable { reason }
            }
        }
    }
}
