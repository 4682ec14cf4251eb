//! Guard error types.

use thiserror::Error;

/// Errors surfaced by the [`Guard`](crate::Guard).
///
/// Policy refusals are not errors; they come back as rejected verdicts.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The request is structurally invalid and was not evaluated.
    #[error(transparent)]
    InvalidRequest(#[from] warden_core::CoreError),

    /// Configuration could not be loaded or resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] warden_config::ConfigError),

    /// The verdict secret is unusable.
    #[error("Integrity error: {0}")]
    Crypto(#[from] warden_crypto::CryptoError),

    /// The audit log could not be opened.
    #[error("Audit error: {0}")]
    Audit(#[from] warden_audit::AuditError),

    /// Evaluation failed.
    #[error("Policy error: {0}")]
    Policy(#[from] warden_policy::PolicyError),

    /// Execution was refused for security reasons or could not be recorded.
    #[error("Execution error: {0}")]
    Executor(#[from] warden_executor::ExecutorError),
}

impl GuardError {
    /// Whether this error reports a forged, tampered or unapproved verdict.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(self, Self::Executor(e) if e.is_security_error())
    }
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
