//! Audit entries - the append-only record of each decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::request::TransactionRequest;
use crate::types::Timestamp;
use crate::verdict::{PolicyVerdict, Violation};

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audit:{}", self.0)
    }
}

/// One decision, as persisted to the audit log.
///
/// Entries are never edited or deleted. The policy engine keeps a rolling
/// 24-hour window of them in memory for windowed accounting; the on-disk
/// log keeps everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// The request that was evaluated.
    pub tx_request: TransactionRequest,
    /// The verdict reached.
    pub verdict: PolicyVerdict,
    /// Copy of the verdict's violations, for flat querying.
    pub violations: Vec<Violation>,
    /// When this entry was recorded.
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Record a verdict, stamped now.
    #[must_use]
    pub fn from_verdict(verdict: &PolicyVerdict) -> Self {
        Self::at(verdict, Timestamp::now())
    }

    /// Record a verdict with an explicit timestamp.
    #[must_use]
    pub fn at(verdict: &PolicyVerdict, timestamp: Timestamp) -> Self {
        Self {
            id: AuditEntryId::new(),
            tx_request: verdict.tx_request.clone(),
            verdict: verdict.clone(),
            violations: verdict.violations.clone(),
            timestamp,
        }
    }

    /// Whether the recorded verdict approved the request.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.verdict.approved
    }

    /// The recorded request's value estimate.
    #[must_use]
    pub fn value_usd(&self) -> f64 {
        self.tx_request.estimated_value_usd
    }
}
