//! Key-to-location mapping.
//!
//! A (namespace, key) pair maps deterministically to a relative path under
//! the storage root:
//!
//! ```text
//! <namespace>/<d[0..2]>/<d[2..4]>/<d>
//! ```
//!
//! where `d` is the lowercase hex SHA-256 of `namespace || 0x1E || key`.
//! Two levels of hex prefix bound every directory's fan-out: a namespace
//! directory holds at most 256 shard directories, each holding at most 256
//! leaf directories, so no directory grows without bound as entries pile up.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Separator between namespace and key in the digest input. Prevents
/// ("ab", "c") and ("a", "bc") from hashing identically.
const DIGEST_SEPARATOR: u8 = 0x1E;

/// Map a (namespace, key) pair to its relative storage location.
pub fn locate(namespace: &str, key: &str) -> PathBuf {
    let digest = digest_hex(namespace, key);
    let mut path = PathBuf::from(namespace);
    path.push(&digest[0..2]);
    path.push(&digest[2..4]);
    path.push(&digest);
    path
}

fn digest_hex(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([DIGEST_SEPARATOR]);
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
