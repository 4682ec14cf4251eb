//! Transaction requests proposed by the agent.
//!
//! A [`TransactionRequest`] is immutable once built. The guard never edits
//! one; it only evaluates it and, if approved, hands it to the execution
//! backend unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::Timestamp;

/// `params` keys that carry a single token symbol.
const TOKEN_KEYS: &[&str] = &["token", "tokenIn", "tokenOut", "fromToken", "toToken"];

/// `params` key that carries a list of token symbols.
const TOKEN_LIST_KEY: &str = "tokens";

/// `params` keys that carry a contract address.
const CONTRACT_KEYS: &[&str] = &["contract", "contractAddress", "router", "pool"];

/// A proposed, value-bearing action.
///
/// # Example
///
/// ```
/// use warden_core::TransactionRequest;
///
/// let request = TransactionRequest::new("transfer", "ethereum", 40.0, "planner")
///     .with_param("token", "USDC")
///     .with_param("contract", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
///
/// assert_eq!(request.referenced_tokens(), vec!["USDC"]);
/// assert_eq!(request.referenced_contracts().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Unique identifier.
    pub id: String,
    /// Action tag, e.g. `"swap"`.
    pub action: String,
    /// Opaque parameters interpreted by the execution backend.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    /// Target network identifier.
    pub chain: String,
    /// Free-text rationale, kept for audit.
    #[serde(default)]
    pub reason: String,
    /// When the request was created.
    pub requested_at: Timestamp,
    /// Value estimate used for all amount-based policy math.
    pub estimated_value_usd: f64,
    /// Who or what proposed the action.
    pub source: String,
}

impl TransactionRequest {
    /// Create a request with a fresh random id and no parameters.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        chain: impl Into<String>,
        estimated_value_usd: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action: action.into(),
            params: BTreeMap::new(),
            chain: chain.into(),
            reason: String::new(),
            requested_at: Timestamp::now(),
            estimated_value_usd,
            source: source.into(),
        }
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the rationale.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Override the creation time.
    #[must_use]
    pub fn with_requested_at(mut self, requested_at: Timestamp) -> Self {
        self.requested_at = requested_at;
        self
    }

    /// Check that the request is structurally usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if a required field is empty,
    /// the value estimate is negative or not finite, or a contract entry is
    /// not a non-empty string. Address formats are chain-specific and are
    /// not checked here; the contract allowlist decides.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("id", &self.id),
            ("action", &self.action),
            ("chain", &self.chain),
            ("source", &self.source),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::invalid(&self.id, field, "must not be empty"));
            }
        }

        if !self.estimated_value_usd.is_finite() || self.estimated_value_usd < 0.0 {
            return Err(CoreError::invalid(
                &self.id,
                "estimatedValueUsd",
                format!(
                    "must be a finite, non-negative number (got {})",
                    self.estimated_value_usd
                ),
            ));
        }

        for key in CONTRACT_KEYS {
            match self.params.get(*key) {
                None => {},
                Some(Value::String(address)) if !address.trim().is_empty() => {},
                Some(other) => {
                    return Err(CoreError::invalid(
                        &self.id,
                        format!("params.{key}"),
                        format!("must be a non-empty address string (got {other})"),
                    ));
                },
            }
        }

        Ok(())
    }

    /// Every token symbol referenced in `params`, in key order.
    ///
    /// Non-string entries are ignored; they carry no symbol to check.
    #[must_use]
    pub fn referenced_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = TOKEN_KEYS
            .iter()
            .filter_map(|key| self.params.get(*key).and_then(Value::as_str))
            .collect();

        if let Some(Value::Array(list)) = self.params.get(TOKEN_LIST_KEY) {
            tokens.extend(list.iter().filter_map(Value::as_str));
        }

        tokens
    }

    /// Every contract address referenced in `params`.
    #[must_use]
    pub fn referenced_contracts(&self) -> Vec<&str> {
        CONTRACT_KEYS
            .iter()
            .filter_map(|key| self.params.get(*key).and_then(Value::as_str))
            .collect()
    }
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} on {} (${:.2}) from {}",
            self.id, self.action, self.chain, self.estimated_value_usd, self.source
        )
    }
}
