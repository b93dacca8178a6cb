//! Cache entry model and expiry bookkeeping.
//!
//! `Expiry` is the per-entry lifetime state; `CacheEntry` is the unit the
//! codec and store move around. Payloads are opaque bytes at this layer -
//! typed (de)serialization lives in the pool facade.

use crate::Timestamp;
use chrono::Duration as ChronoDuration;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When an entry stops being valid.
///
/// `Never` is a distinct state, not a sentinel timestamp: an entry that
/// expires exactly at the Unix epoch is still `At(epoch)`, never confused
/// with one that does not expire at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    /// Never expires.
    Never,
    /// Invalid strictly after the given instant.
    At(Timestamp),
}

impl Expiry {
    /// Expire at `t`, truncated to millisecond precision.
    ///
    /// Expiry bookkeeping is stored with millisecond granularity, so a
    /// sub-millisecond timestamp would come back coarser than it went in.
    /// Truncating up front keeps an entry read back from storage equal to
    /// the entry that was written. Prefer this over constructing `At` with
    /// a raw timestamp.
    pub fn at(t: Timestamp) -> Self {
        match Utc.timestamp_millis_opt(t.timestamp_millis()).single() {
            Some(truncated) => Expiry::At(truncated),
            None => Expiry::At(t),
        }
    }

    /// Whether this expiry has elapsed at `now`.
    ///
    /// An entry whose expiry equals `now` is already expired; reads must
    /// not return it and a sweep at `now` removes it.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(t) => *t <= now,
        }
    }

    /// Compute the expiry produced by writing at `now` with `lifetime`.
    ///
    /// `None` and zero both mean "never expires", matching the pool
    /// contract where an unspecified or zero default lifetime disables
    /// expiration.
    pub fn after_lifetime(now: Timestamp, lifetime: Option<Duration>) -> Self {
        match lifetime {
            None => Expiry::Never,
            Some(d) if d.is_zero() => Expiry::Never,
            Some(d) => {
                // Durations beyond chrono's range saturate to "never";
                // nothing meaningful expires half a billion years out.
                match ChronoDuration::from_std(d) {
                    Ok(delta) => now
                        .checked_add_signed(delta)
                        .map(Expiry::at)
                        .unwrap_or(Expiry::Never),
                    Err(_) => Expiry::Never,
                }
            }
        }
    }
}

/// A single cache entry: the unit of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Opaque identifier, unique within a pool namespace.
    pub key: String,
    /// Opaque serialized payload.
    pub payload: Vec<u8>,
    /// When this entry stops being valid.
    pub expiry: Expiry,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Vec<u8>, expiry: Expiry) -> Self {
        Self {
            key: key.into(),
            payload,
            expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn test_never_is_never_expired() {
        assert!(!Expiry::Never.is_expired(t(0)));
        assert!(!Expiry::Never.is_expired(t(i32::MAX as i64)));
    }

    #[test]
    fn test_at_expiry_boundary() {
        let expiry = Expiry::At(t(100));
        assert!(!expiry.is_expired(t(99)));
        assert!(expiry.is_expired(t(100)));
        assert!(expiry.is_expired(t(101)));
    }

    #[test]
    fn test_epoch_expiry_is_not_never() {
        let epoch = Expiry::At(t(0));
        assert_ne!(epoch, Expiry::Never);
        assert!(epoch.is_expired(t(1)));
    }

    #[test]
    fn test_after_lifetime_none_and_zero_mean_never() {
        let now = t(1_000);
        assert_eq!(Expiry::after_lifetime(now, None), Expiry::Never);
        assert_eq!(
            Expiry::after_lifetime(now, Some(Duration::ZERO)),
            Expiry::Never
        );
    }

    #[test]
    fn test_after_lifetime_adds_duration() {
        let now = t(1_000);
        let expiry = Expiry::after_lifetime(now, Some(Duration::from_secs(60)));
        assert_eq!(expiry, Expiry::At(t(1_060)));
    }

    #[test]
    fn test_at_truncates_to_millisecond_precision() {
        let precise = Utc
            .timestamp_opt(100, 987_654_321)
            .single()
            .expect("valid timestamp");
        let truncated = Utc
            .timestamp_millis_opt(100_987)
            .single()
            .expect("valid timestamp");
        assert_eq!(Expiry::at(precise), Expiry::At(truncated));
        // Already-truncated timestamps pass through unchanged.
        assert_eq!(Expiry::at(truncated), Expiry::At(truncated));
    }

    #[test]
    fn test_after_lifetime_yields_millisecond_precision() {
        let now = Utc
            .timestamp_opt(1_000, 123_456_789)
            .single()
            .expect("valid timestamp");
        let expiry = Expiry::after_lifetime(now, Some(Duration::from_secs(60)));
        match expiry {
            Expiry::At(t) => assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0),
            Expiry::Never => panic!("expected a concrete expiry"),
        }
    }

    #[test]
    fn test_after_lifetime_oversized_saturates_to_never() {
        let now = t(1_000);
        let expiry = Expiry::after_lifetime(now, Some(Duration::from_secs(u64::MAX)));
        assert_eq!(expiry, Expiry::Never);
    }
}
