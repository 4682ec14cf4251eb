//! Warden Config - layered TOML configuration for the transaction guard.
//!
//! Configuration is resolved from, in increasing precedence:
//!
//! 1. Embedded defaults (`defaults.toml`)
//! 2. User config (`~/.warden/config.toml`)
//! 3. An explicitly requested file
//!
//! Environment variables (`WARDEN_SECRET`, `WARDEN_LOG_LEVEL`,
//! `WARDEN_DATA_DIR`) fill in fields no file set.
//!
//! This crate has no dependencies on other warden crates. The runtime
//! converts the sections it reads into domain types.
//!
//! # Example
//!
//! ```
//! use warden_config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.approval.timeout_secs, 300);
//! assert!(config.policy.hitl_threshold_usd < config.policy.max_per_transaction_usd);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod env;
mod error;
mod loader;
mod merge;
mod types;
mod validate;

use std::path::Path;
use std::time::Duration;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use merge::{ConfigLayer, FieldSources, deep_merge};
pub use types::{
    ApprovalSection, Config, IntegritySection, LoggingSection, PolicySection, StoragePaths,
    StorageSection,
};

impl Config {
    /// Load configuration with the full layer precedence, discovering the
    /// user config under the home directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is unreadable or malformed, or if
    /// the merged result fails validation.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None)
    }

    /// Like [`Config::load`], but reads user config from `home/config.toml`
    /// instead of `~/.warden/config.toml`.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_home(explicit: Option<&Path>, home: &Path) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, Some(home))
    }

    /// Load a single file without layering or env fallbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, malformed or
    /// invalid.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Resolve storage locations against the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if the home directory cannot be
    /// determined.
    pub fn storage_paths(&self) -> ConfigResult<StoragePaths> {
        let home = loader::home_directory()?;
        Ok(self.storage.resolve(&home))
    }

    /// The verdict secret: `integrity.secret` if set, otherwise the
    /// environment variable named by `integrity.secret_env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if neither yields a non-empty
    /// value.
    pub fn resolve_secret(&self) -> ConfigResult<String> {
        if let Some(secret) = self.integrity.secret.as_deref().filter(|s| !s.is_empty()) {
            return Ok(secret.to_owned());
        }
        std::env::var(&self.integrity.secret_env)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingSecret {
                env_var: self.integrity.secret_env.clone(),
            })
    }

    /// How long to wait for a human decision. `None` means wait forever.
    #[must_use]
    pub fn approval_timeout(&self) -> Option<Duration> {
        match self.approval.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
