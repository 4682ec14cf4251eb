//! Digests bound to a verdict.

use warden_core::{PolicyVerdict, Timestamp};

use crate::digest::Digest;
use crate::secret::VerdictSecret;

/// Length of an idempotency key in hex characters (256-bit digest).
pub const IDEMPOTENCY_KEY_HEX_LEN: usize = Digest::HEX_LEN;

/// Compute the integrity hash for `(request_id, approved, decided_at)`.
///
/// Deterministic: identical inputs under the same secret always produce the
/// same digest.
#[must_use]
pub fn compute_integrity_hash(
    request_id: &str,
    approved: bool,
    decided_at: Timestamp,
    secret: &VerdictSecret,
) -> Digest {
    let decided_at = decided_at.to_canonical_string();
    Digest::keyed(
        &secret.integrity_key(),
        &[
            request_id.as_bytes(),
            &[u8::from(approved)],
            decided_at.as_bytes(),
        ],
    )
}

/// Stamp `verdict.integrity_hash` from its current fields.
pub fn seal_verdict(verdict: &mut PolicyVerdict, secret: &VerdictSecret) {
    verdict.integrity_hash = compute_integrity_hash(
        &verdict.tx_request.id,
        verdict.approved,
        verdict.decided_at,
        secret,
    )
    .to_hex();
}

/// Re-derive the integrity hash and compare it, in constant time, against
/// the one the verdict carries.
///
/// Returns `false` for a malformed stored hash.
#[must_use]
pub fn verify_integrity(verdict: &PolicyVerdict, secret: &VerdictSecret) -> bool {
    let Ok(stored) = Digest::from_hex(&verdict.integrity_hash) else {
        return false;
    };
    let expected = compute_integrity_hash(
        &verdict.tx_request.id,
        verdict.approved,
        verdict.decided_at,
        secret,
    );
    stored.ct_eq(&expected)
}

/// Derive the idempotency key for one exact decision.
///
/// The key covers the request identity, the outcome and `decided_at`, so
/// re-evaluating the same request later yields a fresh key. Always
/// [`IDEMPOTENCY_KEY_HEX_LEN`] lowercase hex characters.
#[must_use]
pub fn generate_idempotency_key(verdict: &PolicyVerdict, secret: &VerdictSecret) -> String {
    let request = &verdict.tx_request;
    let decided_at = verdict.decided_at.to_canonical_string();
    let value = request.estimated_value_usd.to_bits().to_le_bytes();

    Digest::keyed(
        &secret.idempotency_key(),
        &[
            request.id.as_bytes(),
            request.action.as_bytes(),
            request.chain.as_bytes(),
            &value,
            &[u8::from(verdict.approved)],
            decided_at.as_bytes(),
        ],
    )
    .to_hex()
}
