//! Warden Crypto - Tamper evidence and decision identity for verdicts.
//!
//! This crate provides two distinct, deterministic, secret-keyed digests:
//! - The **integrity hash** binds `(request id, approved, decided_at)` so any
//!   later edit to a verdict is detectable before execution.
//! - The **idempotency key** identifies one exact decision so the executor
//!   dispatches it at most once, however often it is retried.
//!
//! Both are BLAKE3 keyed hashes. Each uses its own key, derived from the
//! shared [`VerdictSecret`] with a distinct derivation context, so an
//! integrity hash can never be replayed as an idempotency key or the
//! reverse.
//!
//! # Example
//!
//! ```
//! use warden_crypto::{VerdictSecret, compute_integrity_hash};
//! use warden_core::Timestamp;
//!
//! let secret = VerdictSecret::new("s3cret");
//! let decided_at = Timestamp::now();
//!
//! let a = compute_integrity_hash("tx-1", true, decided_at, &secret);
//! let b = compute_integrity_hash("tx-1", true, decided_at, &secret);
//! assert_eq!(a, b);
//! assert_ne!(a, compute_integrity_hash("tx-1", false, decided_at, &secret));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod digest;
mod error;
mod secret;
mod verdict;

pub use digest::Digest;
pub use error::{CryptoError, CryptoResult};
pub use secret::VerdictSecret;
pub use verdict::{
    IDEMPOTENCY_KEY_HEX_LEN, compute_integrity_hash, generate_idempotency_key, seal_verdict,
    verify_integrity,
};
