//! Execution outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of dispatching an approved request to the backend.
///
/// `tx_hash` is present on success, `error` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Whether the backend performed the action.
    pub success: bool,
    /// Backend reference for the performed action (e.g. a transaction hash).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Why the backend did not perform the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A successful dispatch.
    #[must_use]
    pub fn success(tx_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash.into()),
            error: None,
        }
    }

    /// A failed dispatch.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.into()),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.success, &self.tx_hash, &self.error) {
            (true, Some(hash), _) => write!(f, "executed ({hash})"),
            (true, None, _) => write!(f, "executed"),
            (false, _, Some(error)) => write!(f, "failed: {error}"),
            (false, _, None) => write!(f, "failed"),
        }
    }
}
