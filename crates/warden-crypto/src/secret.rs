//! The shared secret verdicts are keyed with.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Derivation context for the integrity-hash key.
const INTEGRITY_CONTEXT: &str = "warden 2026-10-01 verdict integrity v1";

/// Derivation context for the idempotency-key key.
const IDEMPOTENCY_CONTEXT: &str = "warden 2026-10-01 idempotency key v1";

/// Secret shared by the policy engine (which seals verdicts) and the
/// executor (which checks them).
///
/// The raw bytes are zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VerdictSecret(Vec<u8>);

impl VerdictSecret {
    /// Wrap secret material.
    ///
    /// Prefer [`VerdictSecret::try_new`] for secrets from configuration;
    /// this constructor accepts an empty secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }

    /// Wrap secret material, rejecting an empty secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EmptySecret`] if `secret` is empty.
    pub fn try_new(secret: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Key used for integrity hashes.
    pub(crate) fn integrity_key(&self) -> [u8; 32] {
        blake3::derive_key(INTEGRITY_CONTEXT, &self.0)
    }

    /// Key used for idempotency keys.
    pub(crate) fn idempotency_key(&self) -> [u8; 32] {
        blake3::derive_key(IDEMPOTENCY_CONTEXT, &self.0)
    }
}

impl fmt::Debug for VerdictSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerdictSecret(***)")
    }
}
