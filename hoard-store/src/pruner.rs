//! Active expiration sweep.
//!
//! A sweep walks every location the store reports, re-reads each entry's
//! *current* bytes, and removes the ones whose lifetime has elapsed plus any
//! that no longer decode. Every disposition is per-entry and independent,
//! which is what makes a sweep safe to run concurrently with reads, writes,
//! and other sweeps, and safe to abandon between entries: partial progress
//! is always valid, and re-invoking resumes the work.
//!
//! Lazy expiration on read and this sweep share no state beyond the storage
//! medium itself. Either alone keeps visibility correct; together they also
//! reclaim space promptly.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

use hoard_core::{HoardResult, Timestamp};

use crate::codec;
use crate::store::EntryStore;

/// Remove every entry expired at `now`, returning how many were removed.
///
/// Corrupt entries count as removed: bytes that cannot decode will never be
/// a hit, so they are garbage to reclaim. A single entry's I/O failure is
/// logged and skipped, never escalated; only failure to enumerate the
/// namespace at all aborts the sweep.
pub fn sweep(store: &dyn EntryStore, now: Timestamp) -> HoardResult<u64> {
    sweep_horizon(store, now, Duration::ZERO)
}

/// Like [`sweep`], but also removes entries that will expire within
/// `horizon` of `now`.
///
/// `sweep(store, now)` is exactly `sweep_horizon(store, now, 0)`.
pub fn sweep_horizon(
    store: &dyn EntryStore,
    now: Timestamp,
    horizon: Duration,
) -> HoardResult<u64> {
    // A horizon too large to represent saturates to the latest instant:
    // "everything expiring within forever" means every entry that expires
    // at all, mirroring the saturate-to-Never choice on the write path.
    let threshold = ChronoDuration::from_std(horizon)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut removed = 0u64;
    for location in store.list_all()? {
        // Decide from the entry's current bytes, never from the listing: a
        // set that raced the walk must not be clobbered based on stale data.
        let bytes = match store.read(&location) {
            Ok(Some(bytes)) => bytes,
            // Vanished since listing: someone else already handled it.
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(location = %location.display(), error = %e, "skipping unreadable entry during sweep");
                continue;
            }
        };

        let doomed = match codec::decode_expiry(&bytes) {
            Ok(expiry) => expiry.is_expired(threshold),
            // Corrupt entries can never be served; reclaim them.
            Err(_) => true,
        };
        if !doomed {
            continue;
        }

        match store.remove(&location) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(location = %location.display(), error = %e, "failed to remove entry during sweep");
            }
        }
    }

    tracing::debug!(removed, "sweep finished");
    Ok(removed)
}
