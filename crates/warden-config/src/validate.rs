//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub(crate) fn validate(config: &Config) -> ConfigResult<()> {
    validate_policy(config)?;
    validate_storage(config)?;
    validate_integrity(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_policy(config: &Config) -> ConfigResult<()> {
    let p = &config.policy;

    for (field, value) in [
        ("policy.max_per_transaction_usd", p.max_per_transaction_usd),
        ("policy.max_daily_usd", p.max_daily_usd),
        ("policy.hitl_threshold_usd", p.hitl_threshold_usd),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(field, "must be a finite positive number"));
        }
    }

    if p.hitl_threshold_usd >= p.max_per_transaction_usd {
        return Err(invalid(
            "policy.hitl_threshold_usd",
            format!(
                "hitl_threshold_usd ({}) must be below max_per_transaction_usd ({})",
                p.hitl_threshold_usd, p.max_per_transaction_usd
            ),
        ));
    }

    if p.max_per_transaction_usd > p.max_daily_usd {
        return Err(invalid(
            "policy.max_per_transaction_usd",
            format!(
                "max_per_transaction_usd ({}) must not exceed max_daily_usd ({})",
                p.max_per_transaction_usd, p.max_daily_usd
            ),
        ));
    }

    if p.max_transactions_per_hour == 0 {
        return Err(invalid("policy.max_transactions_per_hour", "must be at least 1"));
    }
    if p.max_transactions_per_day == 0 {
        return Err(invalid("policy.max_transactions_per_day", "must be at least 1"));
    }

    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    if config.storage.data_dir.trim().is_empty() {
        return Err(invalid("storage.data_dir", "must not be empty"));
    }
    Ok(())
}

fn validate_integrity(config: &Config) -> ConfigResult<()> {
    if config.integrity.secret_env.trim().is_empty() {
        return Err(invalid("integrity.secret_env", "must not be empty"));
    }
    if config.integrity.secret.as_deref() == Some("") {
        return Err(invalid("integrity.secret", "must not be empty when set"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}
