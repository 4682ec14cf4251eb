//! Common value types shared across the guard.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp wrapper for consistent handling throughout warden.
///
/// Serializes transparently as an RFC 3339 string with full sub-second
/// precision, so a verdict's `decidedAt` survives a JSON round trip
/// bit-for-bit (the integrity hash depends on it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// A timestamp `ago` before now. Saturates at the earliest
    /// representable instant.
    #[must_use]
    pub fn ago(ago: Duration) -> Self {
        let now = Utc::now();
        Self(now.checked_sub_signed(ago).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Check whether this timestamp lies within `window` before `now`.
    ///
    /// The window is closed at both ends: an instant exactly `window` old
    /// still counts. Future timestamps (clock skew) count as inside.
    #[must_use]
    pub fn is_within(&self, window: Duration, now: Timestamp) -> bool {
        now.0.signed_duration_since(self.0) <= window
    }

    /// Time elapsed between this timestamp and `now`. Negative if this
    /// timestamp lies in the future.
    #[must_use]
    pub fn age(&self, now: Timestamp) -> Duration {
        now.0.signed_duration_since(self.0)
    }

    /// RFC 3339 with nanosecond precision and a `Z` suffix.
    ///
    /// This is the canonical encoding fed into digests.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
