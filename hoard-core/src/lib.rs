//! Hoard Core - Entry Model and Errors
//!
//! Pure data structures with no I/O. The storage engine in `hoard-store`
//! depends on this; this crate contains ONLY data types, expiry math, and
//! error enums - no business logic.

pub mod config;
pub mod entry;
pub mod error;

pub use config::PoolConfig;
pub use entry::{CacheEntry, Expiry};
pub use error::{DecodeError, HoardResult, PoolConfigError, RegistryError, StoreError};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
