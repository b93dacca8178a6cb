//! Cache pool facade.
//!
//! A pool is a named, isolated namespace of entries exposing `get`, `has`,
//! `set`, `delete`, and (where the backend supports it) `prune`. The facade
//! composes the codec and an [`EntryStore`] and enforces lazy expiration:
//! no read operation ever returns an expired entry, whether or not a sweep
//! has run.

use std::time::Duration;

use chrono::Utc;
use hoard_core::{CacheEntry, Expiry, HoardResult, PoolConfig, StoreError, Timestamp};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pruner;
use crate::store::{EntryStore, FilesystemStore};

/// The operations every cache pool exposes to its orchestration layer.
///
/// Values cross this boundary as opaque bytes so pools of different backends
/// can live behind one trait object; typed accessors are inherent methods on
/// the concrete pool.
pub trait CachePool: Send + Sync {
    /// Read a value. Absent, corrupt, and expired entries are all misses;
    /// an expired entry is removed on discovery.
    fn get(&self, key: &str) -> HoardResult<Option<Vec<u8>>>;

    /// Whether a live entry exists for `key`. Same expiration semantics as
    /// [`get`](CachePool::get).
    fn has(&self, key: &str) -> HoardResult<bool>;

    /// Store a value, unconditionally overwriting any existing entry.
    ///
    /// `lifetime` falls back to the pool's default; an absent or zero
    /// lifetime means the entry never expires.
    fn set(&self, key: &str, value: &[u8], lifetime: Option<Duration>) -> HoardResult<()>;

    /// Remove the entry for `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> HoardResult<()>;

    /// Capability flag: `Some` if this pool's backend can be swept.
    fn as_pruneable(&self) -> Option<&dyn Pruneable> {
        None
    }
}

/// Capability trait for pools whose backend supports an active sweep.
pub trait Pruneable: Send + Sync {
    /// Remove every currently-expired entry, returning the count removed.
    fn prune(&self) -> HoardResult<u64>;
}

/// A cache pool backed by an [`EntryStore`].
pub struct FilesystemPool<S = FilesystemStore> {
    config: PoolConfig,
    store: S,
}

impl FilesystemPool<FilesystemStore> {
    /// Open a pool at `root` using the namespace from `config`.
    pub fn open(root: impl Into<std::path::PathBuf>, config: PoolConfig) -> Self {
        let store = FilesystemStore::new(root, config.namespace());
        Self { config, store }
    }
}

impl<S: EntryStore> FilesystemPool<S> {
    /// Build a pool over an arbitrary store (e.g. a
    /// [`MemoStore`](crate::MemoStore)-wrapped one).
    pub fn with_store(config: PoolConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store a serializable value as JSON.
    pub fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        lifetime: Option<Duration>,
    ) -> HoardResult<()> {
        let payload = serde_json::to_vec(value).map_err(|e| StoreError::Serialize {
            reason: e.to_string(),
        })?;
        self.set(key, &payload, lifetime)
    }

    /// Read a JSON value. A payload that no longer deserializes as `T` is a
    /// miss, like any other corrupt entry.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> HoardResult<Option<T>> {
        match self.get(key)? {
            Some(payload) => Ok(serde_json::from_slice(&payload).ok()),
            None => Ok(None),
        }
    }

    /// Sweep this pool's namespace as of `now`.
    pub fn prune_at(&self, now: Timestamp) -> HoardResult<u64> {
        pruner::sweep(&self.store, now)
    }

    /// Sweep, additionally removing entries that expire within `horizon`.
    pub fn prune_within(&self, horizon: Duration) -> HoardResult<u64> {
        pruner::sweep_horizon(&self.store, Utc::now(), horizon)
    }

    /// Read and decode the entry for `key`, applying lazy expiration.
    fn fetch(&self, key: &str) -> HoardResult<Option<CacheEntry>> {
        let location = self.store.locate(key);
        let bytes = match self.store.read(&location)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let entry = match crate::codec::decode(&bytes) {
            Ok(entry) => entry,
            // Corrupt bytes are a miss; the next sweep reclaims them.
            Err(_) => return Ok(None),
        };
        if entry.expiry.is_expired(Utc::now()) {
            self.store.remove(&location)?;
            return Ok(None);
        }
        Ok(Some(entry))
    }
}

impl<S: EntryStore> CachePool for FilesystemPool<S> {
    fn get(&self, key: &str) -> HoardResult<Option<Vec<u8>>> {
        Ok(self.fetch(key)?.map(|entry| entry.payload))
    }

    fn has(&self, key: &str) -> HoardResult<bool> {
        Ok(self.fetch(key)?.is_some())
    }

    fn set(&self, key: &str, value: &[u8], lifetime: Option<Duration>) -> HoardResult<()> {
        let lifetime = lifetime.or(self.config.default_lifetime());
        let entry = CacheEntry::new(
            key,
            value.to_vec(),
            Expiry::after_lifetime(Utc::now(), lifetime),
        );
        let bytes = crate::codec::encode(&entry)?;
        self.store.write(&self.store.locate(key), &bytes)
    }

    fn delete(&self, key: &str) -> HoardResult<()> {
        self.store.remove(&self.store.locate(key))
    }

    fn as_pruneable(&self) -> Option<&dyn Pruneable> {
        Some(self)
    }
}

impl<S: EntryStore> Pruneable for FilesystemPool<S> {
    fn prune(&self) -> HoardResult<u64> {
        self.prune_at(Utc::now())
    }
}
