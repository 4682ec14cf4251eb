//! Core error types.

use thiserror::Error;

/// Errors raised for structurally invalid input.
///
/// These are caller bugs, not policy outcomes. A well-formed request that
/// breaks a policy produces a rejected verdict, never a `CoreError`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A transaction request is missing a required field or carries an
    /// unusable value.
    #[error("invalid request {request_id}: {field} {reason}")]
    InvalidRequest {
        /// The offending request's id (may be empty).
        request_id: String,
        /// The field that failed validation.
        field: String,
        /// Why the field is invalid.
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid(
        request_id: &str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            request_id: request_id.to_string(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
