//! Configuration types for the warden guard.
//!
//! All types in this module are self-contained with no dependencies on other
//! internal warden crates. Domain types are mirrored here and converted at
//! the boundary. Every struct implements [`Default`] so that a bare
//! `[section]` header in TOML produces a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the guard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy limits and lists.
    pub policy: PolicySection,
    /// Human-approval behaviour.
    pub approval: ApprovalSection,
    /// Where durable state lives.
    pub storage: StorageSection,
    /// Verdict secret.
    pub integrity: IntegritySection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// PolicySection
// ---------------------------------------------------------------------------

/// Mirror of the domain policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Configuration version, logged on every swap.
    pub version: u32,
    /// Largest value of a single transaction (USD).
    pub max_per_transaction_usd: f64,
    /// Largest approved total over the trailing 24 hours (USD).
    pub max_daily_usd: f64,
    /// Most approved transactions in the trailing hour.
    pub max_transactions_per_hour: u32,
    /// Most approved transactions in the trailing 24 hours.
    pub max_transactions_per_day: u32,
    /// Minimum gap after the most recent transaction; `0` disables.
    pub cooldown_seconds: u64,
    /// Values above this need human approval (USD).
    pub hitl_threshold_usd: f64,
    /// Token symbols that may appear in request params.
    pub allowlisted_tokens: Vec<String>,
    /// Contract addresses that may appear in request params.
    pub allowlisted_contracts: Vec<String>,
    /// Action tags that are always rejected.
    pub blocked_actions: Vec<String>,
    /// Consecutive failures that trip the circuit breaker; `0` disables.
    pub circuit_breaker_auto_trip_on_consecutive_failures: u32,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            version: 1,
            max_per_transaction_usd: 100.0,
            max_daily_usd: 500.0,
            max_transactions_per_hour: 10,
            max_transactions_per_day: 50,
            cooldown_seconds: 0,
            hitl_threshold_usd: 50.0,
            allowlisted_tokens: ["USDC", "USDT", "DAI", "ETH", "WETH"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            allowlisted_contracts: Vec::new(),
            blocked_actions: Vec::new(),
            circuit_breaker_auto_trip_on_consecutive_failures: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Human-in-the-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Seconds to wait for a human decision before denying. `0` waits
    /// forever.
    pub timeout_secs: u64,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Locations of the audit log and idempotency store.
///
/// Paths may start with `~/`, which expands to the user's home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Root for all durable state.
    pub data_dir: String,
    /// Audit log directory. Defaults to `{data_dir}/audit`.
    pub audit_dir: Option<String>,
    /// Idempotency store file. Defaults to `{data_dir}/idempotency.jsonl`.
    pub idempotency_file: Option<String>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "~/.warden".to_owned(),
            audit_dir: None,
            idempotency_file: None,
        }
    }
}

/// Storage locations with `~` expanded and defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    /// Root for all durable state.
    pub data_dir: PathBuf,
    /// Audit log directory.
    pub audit_dir: PathBuf,
    /// Idempotency store file.
    pub idempotency_file: PathBuf,
}

impl StoragePaths {
    /// Audit directory name under `data_dir`.
    pub const AUDIT_SUBDIR: &str = "audit";
    /// Idempotency store file name under `data_dir`.
    pub const IDEMPOTENCY_FILE: &str = "idempotency.jsonl";

    /// The default layout rooted at `data_dir`.
    #[must_use]
    pub fn under(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            audit_dir: data_dir.join(Self::AUDIT_SUBDIR),
            idempotency_file: data_dir.join(Self::IDEMPOTENCY_FILE),
            data_dir,
        }
    }
}

impl StorageSection {
    /// Resolve every path against `home`.
    #[must_use]
    pub fn resolve(&self, home: &Path) -> StoragePaths {
        let mut paths = StoragePaths::under(expand_home(&self.data_dir, home));
        if let Some(dir) = &self.audit_dir {
            paths.audit_dir = expand_home(dir, home);
        }
        if let Some(file) = &self.idempotency_file {
            paths.idempotency_file = expand_home(file, home);
        }
        paths
    }
}

fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// IntegritySection
// ---------------------------------------------------------------------------

/// Where the verdict secret comes from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySection {
    /// The secret itself. Prefer the environment variable over storing it
    /// in a file. Never serialized.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Environment variable consulted when `secret` is unset.
    pub secret_env: String,
}

impl std::fmt::Debug for IntegritySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegritySection")
            .field("has_secret", &self.secret.is_some())
            .field("secret_env", &self.secret_env)
            .finish()
    }
}

impl Default for IntegritySection {
    fn default() -> Self {
        Self {
            secret: None,
            secret_env: "WARDEN_SECRET".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["warden_executor=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
