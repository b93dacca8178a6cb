//! Read-accelerating store decorator.
//!
//! `MemoStore` wraps any [`EntryStore`] and memoizes the bytes of entries it
//! has read, keyed by location, so repeated reads of hot entries skip the
//! filesystem entirely. It is the swappable acceleration variant: the same
//! location scheme and codec, a faster read path.
//!
//! # Invalidation obligation
//!
//! Every `write` and `remove` drops the memoized bytes for that location
//! before touching the underlying store. Without this, a stale accelerated
//! copy would be served after a delete.
//!
//! # Staleness scope
//!
//! Memoization only observes mutations performed through this instance.
//! Another process writing the same namespace bypasses the memo; use the
//! plain [`FilesystemStore`](crate::FilesystemStore) when multiple writers
//! share a namespace and read-your-writes across processes matters.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use hoard_core::HoardResult;

use crate::store::{EntryStore, Locations};

/// In-process byte memo over an inner entry store.
pub struct MemoStore<S> {
    inner: S,
    memo: RwLock<HashMap<PathBuf, Arc<Vec<u8>>>>,
}

impl<S: EntryStore> MemoStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Number of locations currently memoized.
    pub fn memoized_count(&self) -> usize {
        self.memo.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Drop every memoized entry. The underlying store is untouched.
    pub fn clear_memo(&self) {
        if let Ok(mut memo) = self.memo.write() {
            memo.clear();
        }
    }

    fn invalidate(&self, location: &Path) {
        if let Ok(mut memo) = self.memo.write() {
            memo.remove(location);
        }
    }

    fn memoized(&self, location: &Path) -> Option<Arc<Vec<u8>>> {
        self.memo
            .read()
            .ok()
            .and_then(|memo| memo.get(location).cloned())
    }
}

impl<S: EntryStore> EntryStore for MemoStore<S> {
    fn locate(&self, key: &str) -> PathBuf {
        self.inner.locate(key)
    }

    fn write(&self, location: &Path, bytes: &[u8]) -> HoardResult<()> {
        self.invalidate(location);
        self.inner.write(location, bytes)
    }

    fn read(&self, location: &Path) -> HoardResult<Option<Arc<Vec<u8>>>> {
        if let Some(bytes) = self.memoized(location) {
            // A memo hit is a refcount bump, no byte copy.
            return Ok(Some(bytes));
        }
        let bytes = self.inner.read(location)?;
        if let Some(bytes) = &bytes {
            if let Ok(mut memo) = self.memo.write() {
                memo.insert(location.to_path_buf(), bytes.clone());
            }
        }
        Ok(bytes)
    }

    fn remove(&self, location: &Path) -> HoardResult<()> {
        self.invalidate(location);
        self.inner.remove(location)
    }

    fn list_all(&self) -> HoardResult<Locations> {
        self.inner.list_all()
    }
}
