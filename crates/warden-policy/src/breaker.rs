//! Circuit breaker - the global, policy-independent kill switch.
//!
//! State lives behind a mutex so the threshold comparison and the trip
//! transition happen atomically. Observers are invoked after the lock is
//! released, exactly once per transition edge.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};
use warden_core::Timestamp;

/// Read-only view of a breaker, consumed by the policy engine and the
/// executor.
pub trait BreakerCheck: Send + Sync {
    /// Whether all new activity must be refused.
    fn is_tripped(&self) -> bool;
}

/// Why the breaker tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripReason {
    /// An operator called [`CircuitBreaker::manual_trip`].
    Manual,
    /// The auto-trip threshold of consecutive failures was reached.
    ConsecutiveFailures,
}

/// Snapshot of breaker state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerState {
    /// Whether the breaker is engaged.
    pub tripped: bool,
    /// Why it tripped. `None` while not tripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_reason: Option<TripReason>,
    /// When it tripped. Present iff `tripped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tripped_at: Option<Timestamp>,
    /// Failures since the last success or resume.
    pub consecutive_failures: u32,
}

type Observer = Arc<dyn Fn(&CircuitBreakerState) + Send + Sync>;

#[derive(Default)]
struct Observers {
    on_trip: Vec<Observer>,
    on_resume: Vec<Observer>,
}

struct Inner {
    state: CircuitBreakerState,
    threshold: u32,
}

/// The global kill switch.
///
/// Share it as `Arc<CircuitBreaker>`; it coerces to `Arc<dyn BreakerCheck>`
/// for the engine and executor.
///
/// # Example
///
/// ```
/// use warden_policy::{BreakerCheck, CircuitBreaker, TripReason};
///
/// let breaker = CircuitBreaker::new(2);
/// breaker.record_failure();
/// assert!(!breaker.is_tripped());
/// breaker.record_failure();
/// assert!(breaker.is_tripped());
/// assert_eq!(breaker.state().trip_reason, Some(TripReason::ConsecutiveFailures));
///
/// assert!(breaker.resume());
/// assert!(!breaker.resume());
/// ```
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    observers: RwLock<Observers>,
}

impl CircuitBreaker {
    /// Create an untripped breaker. A `threshold` of `0` disables auto-trip.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitBreakerState::default(),
                threshold,
            }),
            observers: RwLock::new(Observers::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a failed dispatch. Trips the breaker when the count reaches a
    /// non-zero threshold.
    pub fn record_failure(&self) {
        let tripped = {
            let mut inner = self.lock();
            inner.state.consecutive_failures = inner.state.consecutive_failures.saturating_add(1);
            debug!(
                consecutive_failures = inner.state.consecutive_failures,
                threshold = inner.threshold,
                "Recorded execution failure"
            );

            if inner.threshold > 0
                && !inner.state.tripped
                && inner.state.consecutive_failures >= inner.threshold
            {
                inner.state.tripped = true;
                inner.state.trip_reason = Some(TripReason::ConsecutiveFailures);
                inner.state.tripped_at = Some(Timestamp::now());
                Some(inner.state.clone())
            } else {
                None
            }
        };

        if let Some(state) = tripped {
            warn!(
                consecutive_failures = state.consecutive_failures,
                "Circuit breaker tripped after consecutive failures"
            );
            self.notify_trip(&state);
        }
    }

    /// Reset the failure counter. Does not change trip state.
    pub fn record_success(&self) {
        self.lock().state.consecutive_failures = 0;
    }

    /// Force the breaker on. No-op if already tripped.
    pub fn manual_trip(&self) {
        let tripped = {
            let mut inner = self.lock();
            if inner.state.tripped {
                None
            } else {
                inner.state.tripped = true;
                inner.state.trip_reason = Some(TripReason::Manual);
                inner.state.tripped_at = Some(Timestamp::now());
                Some(inner.state.clone())
            }
        };

        if let Some(state) = tripped {
            warn!("Circuit breaker tripped manually");
            self.notify_trip(&state);
        }
    }

    /// Clear the trip and the failure counter.
    ///
    /// Returns `false` and does nothing if the breaker was not tripped.
    pub fn resume(&self) -> bool {
        let resumed = {
            let mut inner = self.lock();
            if inner.state.tripped {
                inner.state = CircuitBreakerState::default();
                Some(inner.state.clone())
            } else {
                None
            }
        };

        match resumed {
            Some(state) => {
                info!("Circuit breaker resumed");
                self.notify_resume(&state);
                true
            },
            None => false,
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> CircuitBreakerState {
        self.lock().state.clone()
    }

    /// Current auto-trip threshold.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.lock().threshold
    }

    /// Change the auto-trip threshold. Takes effect on the next failure.
    pub fn set_threshold(&self, threshold: u32) {
        self.lock().threshold = threshold;
    }

    /// Register a callback fired once on every untripped → tripped edge.
    pub fn on_trip(&self, observer: impl Fn(&CircuitBreakerState) + Send + Sync + 'static) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .on_trip
            .push(Arc::new(observer));
    }

    /// Register a callback fired once on every tripped → untripped edge.
    pub fn on_resume(&self, observer: impl Fn(&CircuitBreakerState) + Send + Sync + 'static) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .on_resume
            .push(Arc::new(observer));
    }

    fn notify_trip(&self, state: &CircuitBreakerState) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .on_trip
            .clone();
        for observer in observers {
            observer(state);
        }
    }

    fn notify_resume(&self, state: &CircuitBreakerState) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .on_resume
            .clone();
        for observer in observers {
            observer(state);
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(3)
    }
}

impl BreakerCheck for CircuitBreaker {
    fn is_tripped(&self) -> bool {
        self.lock().state.tripped
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("state", &inner.state)
            .field("threshold", &inner.threshold)
            .finish_non_exhaustive()
    }
}
