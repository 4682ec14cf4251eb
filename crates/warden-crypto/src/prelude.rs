//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Digests and secrets
pub use crate::{Digest, VerdictSecret};

// Verdict helpers
pub use crate::{compute_integrity_hash, generate_idempotency_key, seal_verdict, verify_integrity};
