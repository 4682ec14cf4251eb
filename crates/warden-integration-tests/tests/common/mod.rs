//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use warden_config::{Config, StoragePaths};
use warden_core::PolicyConfig;
use warden_runtime::{Guard, GuardBuilder};
use warden_test::{MockBackend, init_test_logging, test_secret};

/// A config whose `[policy]` section mirrors `policy`.
pub fn config_with(policy: &PolicyConfig) -> Config {
    let mut config = Config::default();
    let section = &mut config.policy;
    section.version = policy.version;
    section.max_per_transaction_usd = policy.max_per_transaction_usd;
    section.max_daily_usd = policy.max_daily_usd;
    section.max_transactions_per_hour = policy.max_transactions_per_hour;
    section.max_transactions_per_day = policy.max_transactions_per_day;
    section.cooldown_seconds = policy.cooldown_seconds;
    section.hitl_threshold_usd = policy.hitl_threshold_usd;
    section
        .allowlisted_tokens
        .clone_from(&policy.allowlisted_tokens);
    section
        .allowlisted_contracts
        .clone_from(&policy.allowlisted_contracts);
    section.blocked_actions.clone_from(&policy.blocked_actions);
    section.circuit_breaker_auto_trip_on_consecutive_failures =
        policy.circuit_breaker_auto_trip_on_consecutive_failures;
    config
}

/// A guard persisting under `dir` with the test secret.
pub fn disk_guard(dir: &Path, config: Config, backend: Arc<MockBackend>) -> Guard {
    init_test_logging();
    GuardBuilder::new(config)
        .secret(test_secret())
        .storage_paths(StoragePaths::under(dir))
        .backend(backend)
        .build()
        .unwrap()
}

/// An in-memory guard with the test secret.
pub fn memory_guard(config: Config, backend: Arc<MockBackend>) -> Guard {
    init_test_logging();
    GuardBuilder::new(config)
        .secret(test_secret())
        .in_memory()
        .backend(backend)
        .build()
        .unwrap()
}
