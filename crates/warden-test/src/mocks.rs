//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use warden_core::{ExecutionResult, TransactionRequest};
use warden_executor::ExecutionBackend;
use warden_policy::{ApprovalBridge, BreakerCheck};

/// Scripted human approver.
///
/// Answers are popped in order; once the queue is empty the default answer
/// is used. Uses `std::sync::Mutex` internally so builder methods work
/// without a runtime.
#[derive(Debug, Clone)]
pub struct MockApprovalBridge {
    answers: Arc<Mutex<VecDeque<bool>>>,
    default_answer: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockApprovalBridge {
    /// A bridge that approves everything.
    #[must_use]
    pub fn approving() -> Self {
        Self::with_default(true)
    }

    /// A bridge that denies everything.
    #[must_use]
    pub fn denying() -> Self {
        Self::with_default(false)
    }

    fn with_default(default_answer: bool) -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            default_answer,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue an answer ahead of the default.
    #[must_use]
    pub fn with_answer(self, approve: bool) -> Self {
        if let Ok(mut guard) = self.answers.lock() {
            guard.push_back(approve);
        }
        self
    }

    /// Sleep this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times approval was requested.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of the requests shown to the approver, in order.
    #[must_use]
    pub fn seen_request_ids(&self) -> Vec<String> {
        self.seen.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ApprovalBridge for MockApprovalBridge {
    async fn request_approval(&self, request: &TransactionRequest) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.seen.lock() {
            guard.push(request.id.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .unwrap_or(self.default_answer)
    }
}

/// Execution backend that counts dispatches.
///
/// Every dispatch returns the configured result; the default success
/// hash is `0x` followed by the dispatch number.
#[derive(Debug, Clone)]
pub struct MockBackend {
    result: Option<ExecutionResult>,
    delay: Option<Duration>,
    dispatches: Arc<AtomicUsize>,
}

impl MockBackend {
    /// A backend whose dispatches succeed with a fresh hash each time.
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            result: None,
            delay: None,
            dispatches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A backend whose dispatches all fail with `error`.
    #[must_use]
    pub fn failing(error: impl Into<String>) -> Self {
        Self::returning(ExecutionResult::failure(error))
    }

    /// A backend that always returns `result`.
    #[must_use]
    pub fn returning(result: ExecutionResult) -> Self {
        Self {
            result: Some(result),
            ..Self::succeeding()
        }
    }

    /// Sleep this long inside every dispatch.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times the backend was actually invoked.
    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    async fn dispatch(&self, _request: &TransactionRequest) -> ExecutionResult {
        let n = self.dispatches.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.result {
            Some(result) => result.clone(),
            None => ExecutionResult::success(format!("0x{n:064x}")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A breaker flag with no trip logic of its own.
#[derive(Debug, Default)]
pub struct StaticBreaker {
    tripped: AtomicBool,
}

impl StaticBreaker {
    /// A breaker in the given position.
    #[must_use]
    pub fn new(tripped: bool) -> Self {
        Self {
            tripped: AtomicBool::new(tripped),
        }
    }

    /// Flip the breaker.
    pub fn set_tripped(&self, tripped: bool) {
        self.tripped.store(tripped, Ordering::SeqCst);
    }
}

impl BreakerCheck for StaticBreaker {
    fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}
