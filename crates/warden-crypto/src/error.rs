//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The verdict secret is empty.
    #[error("verdict secret must not be empty")]
    EmptySecret,

    /// Invalid hex encoding or wrong digest length.
    #[error("invalid digest encoding: {0}")]
    InvalidDigest(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
