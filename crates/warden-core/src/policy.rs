//! Policy configuration.
//!
//! A [`PolicyConfig`] is the complete set of limits the policy engine
//! enforces. It is versioned and replaced wholesale at runtime; there is no
//! partial update.

use serde::{Deserialize, Serialize};

/// Limits and lists enforced by the policy engine.
///
/// `hitl_threshold_usd` must sit strictly below `max_per_transaction_usd`:
/// requests between the two are escalated to a human, requests above the
/// per-transaction cap are blocked outright.
///
/// # Example
///
/// ```
/// use warden_core::PolicyConfig;
///
/// let config = PolicyConfig::default();
/// assert!(config.hitl_threshold_usd < config.max_per_transaction_usd);
/// assert!(config.is_token_allowed("usdc"));
/// assert!(!config.is_action_blocked("swap"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    /// Monotonic configuration version, logged on every swap.
    pub version: u32,
    /// Largest value any single transaction may carry (USD).
    pub max_per_transaction_usd: f64,
    /// Largest approved total over the trailing 24 hours (USD).
    pub max_daily_usd: f64,
    /// Most approved transactions in the trailing hour.
    pub max_transactions_per_hour: u32,
    /// Most approved transactions in the trailing 24 hours.
    pub max_transactions_per_day: u32,
    /// Minimum gap after the most recent transaction. `0` disables the check.
    pub cooldown_seconds: u64,
    /// Values above this require human approval.
    pub hitl_threshold_usd: f64,
    /// Token symbols that may appear in request params.
    pub allowlisted_tokens: Vec<String>,
    /// Contract addresses that may appear in request params.
    pub allowlisted_contracts: Vec<String>,
    /// Action tags that are always rejected.
    pub blocked_actions: Vec<String>,
    /// Consecutive execution failures that trip the breaker. `0` disables
    /// auto-trip.
    pub circuit_breaker_auto_trip_on_consecutive_failures: u32,
}

impl PolicyConfig {
    /// Whether `action` is on the blocklist (exact match).
    #[must_use]
    pub fn is_action_blocked(&self, action: &str) -> bool {
        self.blocked_actions.iter().any(|a| a == action)
    }

    /// Whether `token` is allowlisted. Symbols compare case-insensitively.
    #[must_use]
    pub fn is_token_allowed(&self, token: &str) -> bool {
        self.allowlisted_tokens
            .iter()
            .any(|t| t.eq_ignore_ascii_case(token))
    }

    /// Whether `address` is allowlisted. Hex addresses compare
    /// case-insensitively (checksum casing is ignored).
    #[must_use]
    pub fn is_contract_allowed(&self, address: &str) -> bool {
        self.allowlisted_contracts
            .iter()
            .any(|c| c.eq_ignore_ascii_case(address))
    }

    /// Whether a value falls in the human-approval band
    /// `(hitl_threshold_usd, max_per_transaction_usd]`.
    #[must_use]
    pub fn requires_hitl(&self, value_usd: f64) -> bool {
        value_usd > self.hitl_threshold_usd && value_usd <= self.max_per_transaction_usd
    }

    /// Return a copy with the version bumped by one.
    #[must_use]
    pub fn next_version(mut self) -> Self {
        self.version = self.version.saturating_add(1);
        self
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_per_transaction_usd: 100.0,
            max_daily_usd: 500.0,
            max_transactions_per_hour: 10,
            max_transactions_per_day: 50,
            cooldown_seconds: 0,
            hitl_threshold_usd: 50.0,
            allowlisted_tokens: vec![
                "USDC".to_string(),
                "USDT".to_string(),
                "DAI".to_string(),
                "ETH".to_string(),
                "WETH".to_string(),
            ],
            allowlisted_contracts: Vec::new(),
            blocked_actions: Vec::new(),
            circuit_breaker_auto_trip_on_consecutive_failures: 3,
        }
    }
}
