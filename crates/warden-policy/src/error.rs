//! Policy engine error types.

use thiserror::Error;

/// Errors that can occur during evaluation.
///
/// A request that breaks policy is not an error: it yields a rejected
/// verdict. These cover malformed input and broken durability.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The request is structurally invalid.
    #[error(transparent)]
    InvalidRequest(#[from] warden_core::CoreError),

    /// The verdict was reached but could not be persisted.
    #[error("failed to persist verdict: {0}")]
    Audit(#[from] warden_audit::AuditError),
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
