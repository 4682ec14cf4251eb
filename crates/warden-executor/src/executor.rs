//! The executor.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use warden_core::{ExecutionResult, PolicyVerdict};
use warden_crypto::{VerdictSecret, generate_idempotency_key, verify_integrity};
use warden_policy::BreakerCheck;

use crate::backend::ExecutionBackend;
use crate::error::{ExecutorError, ExecutorResult};
use crate::store::IdempotencyStore;

/// Where an execution result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    /// The backend was called for this result.
    Dispatched,
    /// Returned from the idempotency store; nothing was dispatched.
    Replayed,
    /// Refused before dispatch because the breaker is tripped. Not cached.
    Refused,
}

/// Error carried by a result refused because the breaker is tripped.
pub const BREAKER_REFUSAL: &str = "circuit breaker is tripped; dispatch refused";

/// An execution result plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The result returned to the caller.
    pub result: ExecutionResult,
    /// Where `result` came from.
    pub source: OutcomeSource,
    /// The verdict's idempotency key.
    pub idempotency_key: String,
}

impl ExecutionOutcome {
    /// Whether the backend was actually called.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.source == OutcomeSource::Dispatched
    }
}

/// Executes approved verdicts at most once each.
pub struct Executor {
    store: Arc<IdempotencyStore>,
    backend: Arc<dyn ExecutionBackend>,
    breaker: Arc<dyn BreakerCheck>,
    secret: VerdictSecret,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl Executor {
    /// Create an executor.
    #[must_use]
    pub fn new(
        store: Arc<IdempotencyStore>,
        backend: Arc<dyn ExecutionBackend>,
        breaker: Arc<dyn BreakerCheck>,
        secret: VerdictSecret,
    ) -> Self {
        Self {
            store,
            backend,
            breaker,
            secret,
            in_flight: DashMap::new(),
        }
    }

    /// Execute a verdict and return its result.
    ///
    /// # Errors
    ///
    /// See [`execute_outcome`](Self::execute_outcome).
    pub async fn execute(&self, verdict: &PolicyVerdict) -> ExecutorResult<ExecutionResult> {
        Ok(self.execute_outcome(verdict).await?.result)
    }

    /// Execute a verdict, reporting whether the result was dispatched,
    /// replayed or refused.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::UnapprovedVerdict`] or
    /// [`ExecutorError::IntegrityMismatch`] when the security check fails,
    /// whether or not a result is already cached. Returns
    /// [`ExecutorError::StoreIo`] if a fresh result cannot be persisted; the
    /// result is still cached in memory, so a retry replays it instead of
    /// dispatching again.
    pub async fn execute_outcome(&self, verdict: &PolicyVerdict) -> ExecutorResult<ExecutionOutcome> {
        self.security_check(verdict)?;

        let key = generate_idempotency_key(verdict, &self.secret);
        if let Some(result) = self.replay(&key) {
            return Ok(ExecutionOutcome {
                result,
                source: OutcomeSource::Replayed,
                idempotency_key: key,
            });
        }

        let lock = Arc::clone(self.in_flight.entry(key.clone()).or_default().value());
        let outcome = {
            let _guard = lock.lock().await;
            self.dispatch_once(verdict, key.clone()).await
        };
        drop(lock);
        self.in_flight
            .remove_if(&key, |_, waiters| Arc::strong_count(waiters) == 1);
        outcome
    }

    fn security_check(&self, verdict: &PolicyVerdict) -> ExecutorResult<()> {
        let request_id = verdict.request_id();
        if !verdict.approved {
            error!(request_id = %request_id, "Refusing to execute unapproved verdict");
            return Err(ExecutorError::UnapprovedVerdict {
                request_id: request_id.to_string(),
            });
        }
        if !verify_integrity(verdict, &self.secret) {
            error!(
                request_id = %request_id,
                "Integrity hash mismatch, verdict was forged or altered"
            );
            return Err(ExecutorError::IntegrityMismatch {
                request_id: request_id.to_string(),
            });
        }
        Ok(())
    }

    fn replay(&self, key: &str) -> Option<ExecutionResult> {
        let result = self.store.get(key)?;
        debug!(idempotency_key = %key, "Returning cached execution result");
        Some(result)
    }

    /// Runs under the per-key lock. Rechecks the store, since a concurrent
    /// caller may have finished while this one waited.
    async fn dispatch_once(
        &self,
        verdict: &PolicyVerdict,
        key: String,
    ) -> ExecutorResult<ExecutionOutcome> {
        if let Some(result) = self.replay(&key) {
            return Ok(ExecutionOutcome {
                result,
                source: OutcomeSource::Replayed,
                idempotency_key: key,
            });
        }

        if self.breaker.is_tripped() {
            warn!(
                request_id = %verdict.request_id(),
                "Circuit breaker tripped, refusing dispatch"
            );
            return Ok(ExecutionOutcome {
                result: ExecutionResult::failure(BREAKER_REFUSAL),
                source: OutcomeSource::Refused,
                idempotency_key: key,
            });
        }

        let request = &verdict.tx_request;
        debug!(
            request_id = %request.id,
            backend = self.backend.name(),
            "Dispatching approved transaction"
        );
        let result = self.backend.dispatch(request).await;
        self.store.record(&key, &result)?;

        if result.success {
            info!(
                request_id = %request.id,
                tx_hash = result.tx_hash.as_deref().unwrap_or_default(),
                "Transaction executed"
            );
        } else {
            warn!(
                request_id = %request.id,
                error = result.error.as_deref().unwrap_or_default(),
                "Transaction execution failed"
            );
        }

        Ok(ExecutionOutcome {
            result,
            source: OutcomeSource::Dispatched,
            idempotency_key: key,
        })
    }

    /// The idempotency store.
    #[must_use]
    pub fn store(&self) -> &Arc<IdempotencyStore> {
        &self.store
    }

    /// The execution backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ExecutionBackend> {
        &self.backend
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("backend", &self.backend.name())
            .field("cached", &self.store.size())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}
