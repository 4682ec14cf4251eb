//! Verdicts and the violations that justify them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::TransactionRequest;
use crate::types::Timestamp;

/// Which policy produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// The global kill switch is engaged.
    CircuitBreaker,
    /// Blocked action, or a token/contract outside the allowlist.
    Allowlist,
    /// Per-transaction or trailing daily value cap.
    AmountLimit,
    /// Hourly or daily transaction count cap.
    RateLimit,
    /// Too soon after the previous transaction.
    Cooldown,
    /// Human approval was required and not granted.
    Hitl,
}

impl PolicyKind {
    /// The wire tag, e.g. `"amount-limit"`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CircuitBreaker => "circuit-breaker",
            Self::Allowlist => "allowlist",
            Self::AmountLimit => "amount-limit",
            Self::RateLimit => "rate-limit",
            Self::Cooldown => "cooldown",
            Self::Hitl => "hitl",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Prevents approval.
    Block,
    /// Recorded on the verdict but does not prevent approval.
    Advisory,
}

/// A single policy finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The policy that fired.
    pub policy: PolicyKind,
    /// Human-readable detail.
    pub message: String,
    /// Whether this finding blocks approval.
    pub severity: Severity,
}

impl Violation {
    /// Create a blocking violation.
    #[must_use]
    pub fn block(policy: PolicyKind, message: impl Into<String>) -> Self {
        Self {
            policy,
            message: message.into(),
            severity: Severity::Block,
        }
    }

    /// Create a non-blocking advisory.
    #[must_use]
    pub fn advisory(policy: PolicyKind, message: impl Into<String>) -> Self {
        Self {
            policy,
            message: message.into(),
            severity: Severity::Advisory,
        }
    }

    /// Whether this violation prevents approval.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Block
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.policy, self.message)
    }
}

/// Who made the final call on a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    /// Decided automatically from policy.
    PolicyEngine,
    /// Escalated to a human approver.
    Human,
}

impl fmt::Display for DecidedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolicyEngine => f.write_str("policy_engine"),
            Self::Human => f.write_str("human"),
        }
    }
}

/// The decision record for one request.
///
/// A verdict is never edited after it is produced. A change of mind is a
/// new evaluation, hence a new `decided_at`, a new integrity hash and a new
/// idempotency key. Fields are public so verdicts can cross process
/// boundaries; the integrity hash is what makes later edits detectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    /// Whether the request may be executed.
    pub approved: bool,
    /// The request this verdict decided on.
    pub tx_request: TransactionRequest,
    /// Findings, in the order the checks ran.
    pub violations: Vec<Violation>,
    /// Whether the request fell in the human-approval band.
    pub requires_hitl: bool,
    /// Who made the final call.
    pub decided_by: DecidedBy,
    /// When the decision was made.
    pub decided_at: Timestamp,
    /// Secret-keyed digest over `(tx_request.id, approved, decided_at)`.
    pub integrity_hash: String,
}

impl PolicyVerdict {
    /// The id of the request this verdict covers.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.tx_request.id
    }

    /// Whether any violation came from `policy`.
    #[must_use]
    pub fn has_violation(&self, policy: PolicyKind) -> bool {
        self.violations.iter().any(|v| v.policy == policy)
    }

    /// All violations raised by `policy`.
    #[must_use]
    pub fn violations_of(&self, policy: PolicyKind) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.policy == policy)
            .collect()
    }

    /// Whether any blocking violation is present.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.violations.iter().any(Violation::is_blocking)
    }
}

impl fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.approved { "approved" } else { "rejected" };
        write!(
            f,
            "{} {} by {} ({} violation(s))",
            self.tx_request.id,
            outcome,
            self.decided_by,
            self.violations.len()
        )
    }
}
