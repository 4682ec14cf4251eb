//! The guard: policy evaluation, audit and execution wired together.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};
use warden_audit::AuditLog;
use warden_config::{Config, StoragePaths};
use warden_core::{ExecutionResult, PolicyConfig, PolicyVerdict, TransactionRequest};
use warden_crypto::VerdictSecret;
use warden_executor::{ExecutionBackend, Executor, IdempotencyStore, ReadOnlyBackend};
use warden_policy::{ApprovalBridge, BreakerCheck, CircuitBreaker, DAILY_WINDOW, PolicyEngine};

use crate::config_bridge::to_policy_config;
use crate::error::GuardResult;

/// What happened to a submitted request.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The sealed decision.
    pub verdict: PolicyVerdict,
    /// The execution result; `None` when the verdict was a rejection.
    pub execution: Option<ExecutionResult>,
}

impl Submission {
    /// Whether the request was approved and the backend reported success.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.execution.as_ref().is_some_and(|r| r.success)
    }
}

enum Storage {
    Configured,
    Paths(StoragePaths),
    InMemory,
}

/// Builds a [`Guard`] from configuration.
///
/// # Example
///
/// ```
/// use warden_config::Config;
/// use warden_core::TransactionRequest;
/// use warden_crypto::VerdictSecret;
/// use warden_runtime::GuardBuilder;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let guard = GuardBuilder::new(Config::default())
///     .secret(VerdictSecret::new("doc-secret"))
///     .in_memory()
///     .build()
///     .unwrap();
///
/// let request = TransactionRequest::new("transfer", "base", 500.0, "planner");
/// let submission = guard.submit(&request).await.unwrap();
/// assert!(!submission.verdict.approved);
/// assert!(submission.execution.is_none());
/// # });
/// ```
pub struct GuardBuilder {
    config: Config,
    backend: Option<Arc<dyn ExecutionBackend>>,
    approval_bridge: Option<Arc<dyn ApprovalBridge>>,
    secret: Option<VerdictSecret>,
    storage: Storage,
}

impl GuardBuilder {
    /// Start from a loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            backend: None,
            approval_bridge: None,
            secret: None,
            storage: Storage::Configured,
        }
    }

    /// The backend approved requests are dispatched to. Defaults to
    /// [`ReadOnlyBackend`].
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn ExecutionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The human approver for requests in the HITL band.
    #[must_use]
    pub fn approval_bridge(mut self, bridge: Arc<dyn ApprovalBridge>) -> Self {
        self.approval_bridge = Some(bridge);
        self
    }

    /// Use this secret instead of resolving one from configuration.
    #[must_use]
    pub fn secret(mut self, secret: VerdictSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Store durable state at these paths instead of the configured ones.
    #[must_use]
    pub fn storage_paths(mut self, paths: StoragePaths) -> Self {
        self.storage = Storage::Paths(paths);
        self
    }

    /// Keep all state in memory. Nothing survives the process.
    #[must_use]
    pub fn in_memory(mut self) -> Self {
        self.storage = Storage::InMemory;
        self
    }

    /// Open storage, seed the engine with the last 24 hours of decisions
    /// and wire everything together.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable secret is available, the storage
    /// paths cannot be resolved, or the audit directory cannot be created.
    pub fn build(self) -> GuardResult<Guard> {
        let secret = match self.secret {
            Some(secret) => secret,
            None => VerdictSecret::try_new(self.config.resolve_secret()?)?,
        };

        let (audit_log, store) = match self.storage {
            Storage::InMemory => (AuditLog::in_memory(), IdempotencyStore::in_memory()),
            Storage::Paths(paths) => open_storage(&paths)?,
            Storage::Configured => open_storage(&self.config.storage_paths()?)?,
        };

        let policy = to_policy_config(&self.config.policy);
        let breaker = Arc::new(CircuitBreaker::new(
            policy.circuit_breaker_auto_trip_on_consecutive_failures,
        ));
        breaker.on_trip(|state| {
            error!(
                reason = ?state.trip_reason,
                consecutive_failures = state.consecutive_failures,
                "Execution halted by circuit breaker"
            );
        });
        breaker.on_resume(|_| info!("Execution resumed"));

        let breaker_check: Arc<dyn BreakerCheck> = breaker.clone();
        let mut engine = PolicyEngine::new(policy, Arc::clone(&breaker_check), secret.clone())
            .with_audit_log(audit_log.clone());
        if let Some(bridge) = self.approval_bridge {
            engine = engine.with_approval_bridge(bridge);
        }
        if let Some(timeout) = self.config.approval_timeout() {
            engine = engine.with_approval_timeout(timeout);
        }

        match audit_log.recent(DAILY_WINDOW) {
            Ok(entries) => engine.load_history(entries),
            Err(e) => warn!(error = %e, "Audit log unreadable, starting with empty history"),
        }

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(ReadOnlyBackend));
        info!(
            backend = backend.name(),
            history = engine.history_len(),
            cached_results = store.size(),
            "Guard ready"
        );
        let executor = Executor::new(Arc::new(store), backend, breaker_check, secret);

        Ok(Guard {
            engine,
            executor,
            breaker,
            audit_log,
        })
    }
}

impl fmt::Debug for GuardBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardBuilder")
            .field("has_backend", &self.backend.is_some())
            .field("has_approval_bridge", &self.approval_bridge.is_some())
            .field("has_secret", &self.secret.is_some())
            .finish_non_exhaustive()
    }
}

fn open_storage(paths: &StoragePaths) -> GuardResult<(AuditLog, IdempotencyStore)> {
    let audit_log = AuditLog::open(&paths.audit_dir)?;
    let store = IdempotencyStore::open(&paths.idempotency_file);
    Ok((audit_log, store))
}

/// Evaluates requests and executes the approved ones exactly once.
///
/// `Guard` is `Send + Sync`; share it behind an `Arc`.
pub struct Guard {
    engine: PolicyEngine,
    executor: Executor,
    breaker: Arc<CircuitBreaker>,
    audit_log: AuditLog,
}

impl Guard {
    /// Evaluate a request and, if approved, execute it.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidRequest`](crate::GuardError::InvalidRequest)
    /// for a malformed request, and propagates audit persistence and
    /// idempotency store failures. Policy refusals are not errors.
    pub async fn submit(&self, request: &TransactionRequest) -> GuardResult<Submission> {
        request.validate()?;

        let verdict = self.engine.evaluate(request).await?;
        if !verdict.approved {
            return Ok(Submission {
                verdict,
                execution: None,
            });
        }

        let result = self.execute(&verdict).await?;
        Ok(Submission {
            verdict,
            execution: Some(result),
        })
    }

    /// Execute a verdict obtained earlier. Re-executing a verdict returns
    /// the recorded result without dispatching again.
    ///
    /// Only fresh dispatches count toward the breaker's failure streak.
    /// Refusals from a read-only backend are not failures.
    ///
    /// # Errors
    ///
    /// Returns a security error for an unapproved or tampered verdict.
    pub async fn execute(&self, verdict: &PolicyVerdict) -> GuardResult<ExecutionResult> {
        let outcome = self.executor.execute_outcome(verdict).await?;
        if outcome.is_fresh() && !self.executor.backend().is_read_only() {
            if outcome.result.success {
                self.breaker.record_success();
            } else {
                self.breaker.record_failure();
            }
        }
        Ok(outcome.result)
    }

    /// Replace the policy configuration, including the breaker's auto-trip
    /// threshold.
    pub fn update_policy(&self, config: PolicyConfig) {
        self.breaker
            .set_threshold(config.circuit_breaker_auto_trip_on_consecutive_failures);
        self.engine.update_config(config);
    }

    /// The circuit breaker.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// The policy engine.
    #[must_use]
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// The executor.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// The audit log.
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("breaker", &self.breaker)
            .field("policy_version", &self.engine.config().version)
            .finish_non_exhaustive()
    }
}
