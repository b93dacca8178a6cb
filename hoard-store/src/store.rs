//! Physical entry storage.
//!
//! `EntryStore` is the seam between the pool facade / pruner and the durable
//! medium. `FilesystemStore` is the production implementation: one file per
//! entry beneath a sharded namespace directory, with atomicity provided by
//! the filesystem's rename and unlink semantics. No location is ever
//! modified in place.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hoard_core::{HoardResult, StoreError};
use tempfile::NamedTempFile;

use crate::location;

/// Lazy sequence of entry locations produced by [`EntryStore::list_all`].
pub type Locations = Box<dyn Iterator<Item = PathBuf> + Send>;

/// Physical read/write/delete of entries at mapped locations.
///
/// Implementations must be safe under concurrent access from multiple
/// callers and processes without external locking: `write` is atomic from a
/// reader's point of view, `remove` is idempotent, and `list_all` tolerates
/// entries appearing and disappearing mid-walk.
pub trait EntryStore: Send + Sync {
    /// Map a key to its absolute storage location.
    fn locate(&self, key: &str) -> PathBuf;

    /// Atomically replace whatever is at `location` with `bytes`.
    ///
    /// A reader racing this call observes the old bytes or the new bytes,
    /// never a torn mixture; a crash mid-write leaves the old entry or no
    /// entry.
    fn write(&self, location: &Path, bytes: &[u8]) -> HoardResult<()>;

    /// Read the bytes at `location`. `Ok(None)` means absent.
    ///
    /// Bytes come back shared so a memoizing store can serve repeated
    /// reads without copying the payload.
    fn read(&self, location: &Path) -> HoardResult<Option<Arc<Vec<u8>>>>;

    /// Remove the entry at `location`. Removing an absent location is not
    /// an error.
    fn remove(&self, location: &Path) -> HoardResult<()>;

    /// One-pass lazy iteration over every entry location currently present,
    /// in unspecified order.
    ///
    /// Fails only when the namespace root itself cannot be enumerated.
    fn list_all(&self) -> HoardResult<Locations>;
}

/// Filesystem-backed entry store for one pool namespace.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
    namespace: String,
    namespace_root: PathBuf,
}

impl FilesystemStore {
    /// Create a store rooted at `root` for the given namespace.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        let root = root.into();
        let namespace = namespace.into();
        let namespace_root = root.join(&namespace);
        Self {
            root,
            namespace,
            namespace_root,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The directory all of this namespace's entries live under.
    pub fn namespace_root(&self) -> &Path {
        &self.namespace_root
    }

    fn io_error(location: &Path, e: impl std::fmt::Display) -> StoreError {
        StoreError::Io {
            path: location.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

impl EntryStore for FilesystemStore {
    fn locate(&self, key: &str) -> PathBuf {
        self.root.join(location::locate(&self.namespace, key))
    }

    fn write(&self, location: &Path, bytes: &[u8]) -> HoardResult<()> {
        let parent = location
            .parent()
            .ok_or_else(|| Self::io_error(location, "location has no parent directory"))?;
        fs::create_dir_all(parent).map_err(|e| Self::io_error(location, e))?;

        // The temp file lives in the namespace root, above the two shard
        // levels the walker visits, so a concurrent sweep never observes a
        // partially written entry.
        let mut tmp = NamedTempFile::new_in(&self.namespace_root)
            .map_err(|e| Self::io_error(location, e))?;
        tmp.write_all(bytes).map_err(|e| Self::io_error(location, e))?;
        tmp.persist(location)
            .map_err(|e| Self::io_error(location, e.error))?;
        Ok(())
    }

    fn read(&self, location: &Path) -> HoardResult<Option<Arc<Vec<u8>>>> {
        match fs::read(location) {
            Ok(bytes) => Ok(Some(Arc::new(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(location, e)),
        }
    }

    fn remove(&self, location: &Path) -> HoardResult<()> {
        match fs::remove_file(location) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Self::io_error(location, e)),
        }

        // Opportunistically drop shard directories left empty. remove_dir
        // refuses non-empty directories, so a concurrent writer's entries
        // are never at risk; any failure here is ignored.
        if let Some(leaf) = location.parent() {
            if leaf != self.namespace_root && fs::remove_dir(leaf).is_ok() {
                if let Some(shard) = leaf.parent() {
                    if shard != self.namespace_root {
                        let _ = fs::remove_dir(shard);
                    }
                }
            }
        }
        Ok(())
    }

    fn list_all(&self) -> HoardResult<Locations> {
        let shards = match fs::read_dir(&self.namespace_root) {
            Ok(iter) => Some(iter),
            // A namespace that has never been written to is empty, not
            // broken.
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(StoreError::NamespaceUnavailable {
                    root: self.namespace_root.clone(),
                    reason: e.to_string(),
                })
            }
        };
        Ok(Box::new(Walk {
            shards,
            leaves: None,
            files: None,
        }))
    }
}

/// Walks namespace/<shard>/<leaf>/<entry> lazily, skipping anything that
/// vanishes or fails to enumerate mid-walk.
struct Walk {
    shards: Option<fs::ReadDir>,
    leaves: Option<fs::ReadDir>,
    files: Option<fs::ReadDir>,
}

impl Walk {
    /// Next subdirectory from `iter`, skipping files and unreadable entries.
    fn next_dir(iter: &mut fs::ReadDir) -> Option<Option<PathBuf>> {
        match iter.next()? {
            Ok(entry) => {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                Some(is_dir.then(|| entry.path()))
            }
            Err(_) => Some(None),
        }
    }
}

impl Iterator for Walk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(files) = self.files.as_mut() {
                match files.next() {
                    Some(Ok(entry)) => {
                        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                            return Some(entry.path());
                        }
                    }
                    Some(Err(_)) => {}
                    None => self.files = None,
                }
                continue;
            }

            if let Some(leaves) = self.leaves.as_mut() {
                match Self::next_dir(leaves) {
                    Some(Some(leaf)) => self.files = fs::read_dir(leaf).ok(),
                    Some(None) => {}
                    None => self.leaves = None,
                }
                continue;
            }

            let shards = self.shards.as_mut()?;
            match Self::next_dir(shards) {
                Some(Some(shard)) => self.leaves = fs::read_dir(shard).ok(),
                Some(None) => {}
                None => self.shards = None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_store() -> (FilesystemStore, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = FilesystemStore::new(temp_dir.path(), "app");
        (store, temp_dir)
    }

    #[test]
    fn test_write_then_read() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("user:1");

        store
            .write(&location, b"payload")
            .expect("write should succeed");
        let bytes = store
            .read(&location)
            .expect("read should succeed")
            .expect("entry should exist");
        assert_eq!(bytes.as_slice(), &b"payload"[..]);
    }

    #[test]
    fn test_read_absent_is_none() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("never-written");
        assert_eq!(store.read(&location).expect("read should succeed"), None);
    }

    #[test]
    fn test_write_overwrites() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("user:1");

        store.write(&location, b"old").expect("write should succeed");
        store.write(&location, b"new").expect("write should succeed");
        let bytes = store
            .read(&location)
            .expect("read should succeed")
            .expect("entry should exist");
        assert_eq!(bytes.as_slice(), &b"new"[..]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("user:1");

        store
            .write(&location, b"payload")
            .expect("write should succeed");
        store.remove(&location).expect("remove should succeed");
        store
            .remove(&location)
            .expect("removing an absent location should succeed");
        assert_eq!(store.read(&location).expect("read should succeed"), None);
    }

    #[test]
    fn test_remove_cleans_empty_shard_dirs() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("user:1");

        store
            .write(&location, b"payload")
            .expect("write should succeed");
        store.remove(&location).expect("remove should succeed");

        let leaf = location.parent().expect("leaf dir");
        let shard = leaf.parent().expect("shard dir");
        assert!(!leaf.exists());
        assert!(!shard.exists());
        // The namespace root itself stays.
        assert!(store.namespace_root().exists());
    }

    #[test]
    fn test_remove_keeps_nonempty_shard_dirs() {
        let (store, _temp_dir) = create_test_store();
        // Find two keys sharing a first-level shard.
        let first = store.locate("k-0");
        let shard_of = |p: &Path| p.ancestors().nth(2).expect("shard").to_path_buf();
        let sibling = (1..10_000)
            .map(|i| store.locate(&format!("k-{i}")))
            .find(|p| shard_of(p) == shard_of(&first))
            .expect("some key should share a shard");

        store.write(&first, b"a").expect("write should succeed");
        store.write(&sibling, b"b").expect("write should succeed");
        store.remove(&first).expect("remove should succeed");

        assert!(shard_of(&sibling).exists());
        let bytes = store
            .read(&sibling)
            .expect("read should succeed")
            .expect("sibling should exist");
        assert_eq!(bytes.as_slice(), &b"b"[..]);
    }

    #[test]
    fn test_list_all_empty_namespace() {
        let (store, _temp_dir) = create_test_store();
        let listed: Vec<_> = store.list_all().expect("list should succeed").collect();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_list_all_sees_every_entry_once() {
        let (store, _temp_dir) = create_test_store();
        let mut expected = HashSet::new();
        for i in 0..25 {
            let location = store.locate(&format!("key-{i}"));
            store.write(&location, b"v").expect("write should succeed");
            expected.insert(location);
        }

        let listed: Vec<_> = store.list_all().expect("list should succeed").collect();
        assert_eq!(listed.len(), expected.len(), "no duplicates");
        assert_eq!(listed.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_list_all_skips_stray_temp_files() {
        let (store, _temp_dir) = create_test_store();
        let location = store.locate("user:1");
        store
            .write(&location, b"payload")
            .expect("write should succeed");

        // Simulate a crash mid-write: an orphaned temp file in the
        // namespace root, where write() stages its data.
        let stray = store.namespace_root().join(".tmpabc123");
        fs::write(&stray, b"torn half-written bytes").expect("stray write should succeed");

        let listed: Vec<_> = store.list_all().expect("list should succeed").collect();
        assert_eq!(listed, vec![location]);
    }

    #[test]
    fn test_list_all_unreadable_root_is_fatal() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        // Occupy the namespace root with a plain file so read_dir fails
        // with something other than NotFound.
        fs::write(temp_dir.path().join("app"), b"not a directory")
            .expect("file write should succeed");
        let store = FilesystemStore::new(temp_dir.path(), "app");

        let result = store.list_all().map(|iter| iter.count());
        assert!(matches!(
            result,
            Err(StoreError::NamespaceUnavailable { .. })
        ));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let app = FilesystemStore::new(temp_dir.path(), "app");
        let sessions = FilesystemStore::new(temp_dir.path(), "sessions");

        let location = app.locate("shared-key");
        app.write(&location, b"app-value").expect("write should succeed");

        assert_ne!(location, sessions.locate("shared-key"));
        let listed: Vec<_> = sessions.list_all().expect("list should succeed").collect();
        assert!(listed.is_empty());
    }
}
