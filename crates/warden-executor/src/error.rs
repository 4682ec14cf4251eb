//! Executor error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during execution.
///
/// The two security variants are fatal for the call and must never be
/// retried automatically.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The verdict did not approve the request.
    #[error("refusing to execute unapproved verdict for request {request_id}")]
    UnapprovedVerdict {
        /// The request the verdict covers.
        request_id: String,
    },

    /// The integrity hash does not match the verdict's fields.
    #[error("integrity hash mismatch for request {request_id}: verdict was forged or altered")]
    IntegrityMismatch {
        /// The request the verdict covers.
        request_id: String,
    },

    /// Writing the idempotency store failed.
    #[error("idempotency store I/O error at {path}: {source}")]
    StoreIo {
        /// The backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ExecutorError {
    /// Whether this error signals a forged, altered or unapproved verdict.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::UnapprovedVerdict { .. } | Self::IntegrityMismatch { .. }
        )
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
