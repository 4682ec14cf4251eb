//! Bridge from `warden_config::Config` to domain types.
//!
//! The config crate has no dependencies on other warden crates. These
//! functions translate its sections into the types the engine and the
//! subscriber setup consume.

use warden_config::{Config, PolicySection};
use warden_core::PolicyConfig;
use warden_telemetry::LogConfig;

/// Convert the `[policy]` section to a [`PolicyConfig`].
#[must_use]
pub fn to_policy_config(section: &PolicySection) -> PolicyConfig {
    PolicyConfig {
        version: section.version,
        max_per_transaction_usd: section.max_per_transaction_usd,
        max_daily_usd: section.max_daily_usd,
        max_transactions_per_hour: section.max_transactions_per_hour,
        max_transactions_per_day: section.max_transactions_per_day,
        cooldown_seconds: section.cooldown_seconds,
        hitl_threshold_usd: section.hitl_threshold_usd,
        allowlisted_tokens: section.allowlisted_tokens.clone(),
        allowlisted_contracts: section.allowlisted_contracts.clone(),
        blocked_actions: section.blocked_actions.clone(),
        circuit_breaker_auto_trip_on_consecutive_failures: section
            .circuit_breaker_auto_trip_on_consecutive_failures,
    }
}

/// Convert the `[logging]` section to a [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    LogConfig::from(&cfg.logging)
}
