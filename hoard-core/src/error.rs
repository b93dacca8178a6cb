//! Error types for hoard operations
//!
//! An absent entry is NOT an error anywhere in this crate family: reads
//! return `Option` and removes are idempotent. The enums here cover the
//! conditions that are actually exceptional.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the storage engine.
pub type HoardResult<T> = Result<T, StoreError>;

/// Entry decoding errors.
///
/// Any of these means the bytes at a location are not a valid entry.
/// Readers treat that as a miss; the pruner treats it as garbage to
/// reclaim. Corruption is never surfaced as a hit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Entry truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("Bad magic bytes, not a hoard entry")]
    BadMagic,

    #[error("Unsupported entry format version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Invalid expiry encoding: {reason}")]
    InvalidExpiry { reason: String },

    #[error("Entry key is not valid UTF-8")]
    KeyNotUtf8,

    #[error("Key length field says {declared} bytes but only {available} remain")]
    KeyLengthMismatch { declared: usize, available: usize },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// I/O failure on a single entry location.
    #[error("I/O error at {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    /// The namespace root cannot be enumerated at all. Fatal for a sweep.
    #[error("Namespace root {} unavailable: {reason}", .root.display())]
    NamespaceUnavailable { root: PathBuf, reason: String },

    /// Payload serialization failed on a typed `set`.
    #[error("Serialization failed: {reason}")]
    Serialize { reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Pool configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolConfigError {
    #[error("Pool namespace must not be empty")]
    EmptyNamespace,

    #[error("Pool namespace {namespace:?} contains invalid character {found:?}")]
    InvalidNamespace { namespace: String, found: char },

    #[error("Pool namespace is {length} bytes, maximum is {max}")]
    NamespaceTooLong { length: usize, max: usize },
}

/// Errors from the named-pool registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The named pool does not exist or does not support pruning.
    #[error("The {name:?} pool does not exist or is not pruneable")]
    UnknownPool { name: String },

    #[error("No pruneable cache pools found")]
    NoPruneablePools,
}
