//! Test fixtures for common types.

use chrono::Duration;

use warden_core::{
    AuditEntry, DecidedBy, PolicyConfig, PolicyKind, PolicyVerdict, Timestamp,
    TransactionRequest, Violation,
};
use warden_crypto::{VerdictSecret, seal_verdict};

/// Secret shared by every fixture that seals a verdict.
pub const TEST_SECRET: &str = "warden-test-secret";

/// The secret behind [`TEST_SECRET`].
#[must_use]
pub fn test_secret() -> VerdictSecret {
    VerdictSecret::new(TEST_SECRET)
}

/// A USDC transfer on Base worth `value_usd`.
#[must_use]
pub fn test_request(value_usd: f64) -> TransactionRequest {
    TransactionRequest::new("transfer", "base", value_usd, "test-agent")
        .with_param("token", "USDC")
        .with_reason("fixture")
}

/// Default limits with cooldown off, a HITL band of (50, 100] and a
/// $1000 daily cap.
#[must_use]
pub fn test_policy_config() -> PolicyConfig {
    PolicyConfig {
        max_per_transaction_usd: 100.0,
        max_daily_usd: 1_000.0,
        max_transactions_per_hour: 10,
        max_transactions_per_day: 50,
        cooldown_seconds: 0,
        hitl_threshold_usd: 50.0,
        ..PolicyConfig::default()
    }
}

fn sealed_verdict(
    request: TransactionRequest,
    approved: bool,
    decided_at: Timestamp,
) -> PolicyVerdict {
    let violations = if approved {
        Vec::new()
    } else {
        vec![Violation::block(PolicyKind::AmountLimit, "fixture rejection")]
    };
    let mut verdict = PolicyVerdict {
        approved,
        tx_request: request,
        violations,
        requires_hitl: false,
        decided_by: DecidedBy::PolicyEngine,
        decided_at,
        integrity_hash: String::new(),
    };
    seal_verdict(&mut verdict, &test_secret());
    verdict
}

/// An approved decision worth `value_usd`, recorded `age` ago.
#[must_use]
pub fn approved_entry(value_usd: f64, age: Duration) -> AuditEntry {
    let at = Timestamp::ago(age);
    let request = test_request(value_usd).with_requested_at(at);
    AuditEntry::at(&sealed_verdict(request, true, at), at)
}

/// A rejected decision worth `value_usd`, recorded `age` ago.
#[must_use]
pub fn rejected_entry(value_usd: f64, age: Duration) -> AuditEntry {
    let at = Timestamp::ago(age);
    let request = test_request(value_usd).with_requested_at(at);
    AuditEntry::at(&sealed_verdict(request, false, at), at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_crypto::verify_integrity;

    #[test]
    fn test_request_fixture_is_valid() {
        let request = test_request(25.0);
        assert!(request.validate().is_ok());
        assert_eq!(request.referenced_tokens(), vec!["USDC"]);
    }

    #[test]
    fn test_policy_config_fixture_band() {
        let config = test_policy_config();
        assert!(!config.requires_hitl(50.0));
        assert!(config.requires_hitl(75.0));
    }

    #[test]
    fn test_entries_are_sealed_and_aged() {
        let approved = approved_entry(20.0, Duration::minutes(30));
        assert!(approved.is_approved());
        assert!(verify_integrity(&approved.verdict, &test_secret()));
        assert!(approved.timestamp.age(Timestamp::now()) >= Duration::minutes(30));

        let rejected = rejected_entry(20.0, Duration::hours(2));
        assert!(!rejected.is_approved());
        assert!(rejected.verdict.is_blocked());
    }
}
