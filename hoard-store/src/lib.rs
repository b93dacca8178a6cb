//! Hoard Store - Persistent TTL Cache Pools
//!
//! Filesystem-backed cache pools with per-entry expiration. Each pool is an
//! isolated namespace of durable entries; reads apply lazy expiration (an
//! expired entry is never a hit, pruned or not) and an active sweep walks a
//! namespace to reclaim expired and corrupt entries in bulk.
//!
//! The layers, leaf first:
//! - [`codec`] - entry bytes: fixed expiry header + opaque payload
//! - [`location`] - key to sharded-path mapping
//! - [`store`] - physical read/write/delete, atomic per location
//! - [`memo_store`] - read-accelerating store decorator
//! - [`pool`] - the `get`/`has`/`set`/`delete`/`prune` facade
//! - [`pruner`] - the store-wide expiration sweep
//! - [`registry`] - named pools and multi-pool prune orchestration
//!
//! # Example
//!
//! ```no_run
//! use hoard_core::PoolConfig;
//! use hoard_store::{CachePool, FilesystemPool};
//! use std::time::Duration;
//!
//! let config = PoolConfig::new("app", Some(Duration::from_secs(3600)))?;
//! let pool = FilesystemPool::open("/var/cache/hoard", config);
//!
//! pool.set("user:42", b"ada", None)?;
//! assert!(pool.has("user:42")?);
//!
//! let removed = pool.prune_at(chrono::Utc::now())?;
//! # let _ = removed;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod location;
pub mod memo_store;
pub mod pool;
pub mod pruner;
pub mod registry;
pub mod store;

pub use memo_store::MemoStore;
pub use pool::{CachePool, FilesystemPool, Pruneable};
pub use pruner::{sweep, sweep_horizon};
pub use registry::{PoolRegistry, PruneOutcome};
pub use store::{EntryStore, FilesystemStore, Locations};

// Re-export the core types callers need alongside the engine.
pub use hoard_core::{
    CacheEntry, DecodeError, Expiry, HoardResult, PoolConfig, PoolConfigError, RegistryError,
    StoreError, Timestamp,
};
