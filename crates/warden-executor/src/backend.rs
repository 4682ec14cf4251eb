//! Execution backends.

use async_trait::async_trait;
use warden_core::{ExecutionResult, TransactionRequest};

/// Error carried by every [`ReadOnlyBackend`] result.
pub const READ_ONLY_ERROR: &str = "read-only mode: no execution backend is configured";

/// Performs the real effect of an approved request.
///
/// Failures are reported in the returned [`ExecutionResult`], not as
/// errors; the executor records them like any other outcome.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Dispatch the request.
    async fn dispatch(&self, request: &TransactionRequest) -> ExecutionResult;

    /// Short name for logs.
    fn name(&self) -> &str {
        "backend"
    }

    /// Whether this backend refuses every dispatch by construction. Its
    /// refusals are not backend failures and do not feed the breaker.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// Refuses every dispatch. The safe default until a real backend is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyBackend;

#[async_trait]
impl ExecutionBackend for ReadOnlyBackend {
    async fn dispatch(&self, _request: &TransactionRequest) -> ExecutionResult {
        ExecutionResult::failure(READ_ONLY_ERROR)
    }

    fn name(&self) -> &str {
        "read-only"
    }

    fn is_read_only(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_only_refuses() {
        let request = TransactionRequest::new("swap", "base", 1.0, "agent");
        let result = ReadOnlyBackend.dispatch(&request).await;
        assert!(!result.success);
        assert!(result.tx_hash.is_none());
        assert_eq!(result.error.as_deref(), Some(READ_ONLY_ERROR));
        assert!(ReadOnlyBackend.is_read_only());
    }
}
