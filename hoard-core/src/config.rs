//! Pool configuration.

use crate::error::PoolConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Namespaces become directory names; keep them short and portable.
const MAX_NAMESPACE_LEN: usize = 64;

/// Configuration for a single cache pool.
///
/// The namespace isolates this pool's entries from every other pool
/// sharing the same storage root. Two pools never share location space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    namespace: String,
    /// Applied when a `set` does not specify a lifetime. `None` means
    /// entries without an explicit lifetime never expire.
    default_lifetime: Option<Duration>,
}

impl PoolConfig {
    /// Create a validated pool configuration.
    ///
    /// The namespace must be non-empty, at most 64 bytes, and restricted
    /// to `[A-Za-z0-9._-]` since it is used verbatim as a directory name.
    pub fn new(
        namespace: impl Into<String>,
        default_lifetime: Option<Duration>,
    ) -> Result<Self, PoolConfigError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(PoolConfigError::EmptyNamespace);
        }
        if namespace.len() > MAX_NAMESPACE_LEN {
            return Err(PoolConfigError::NamespaceTooLong {
                length: namespace.len(),
                max: MAX_NAMESPACE_LEN,
            });
        }
        if let Some(found) = namespace
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(PoolConfigError::InvalidNamespace { namespace, found });
        }
        Ok(Self {
            namespace,
            default_lifetime,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_lifetime(&self) -> Option<Duration> {
        self.default_lifetime
    }
}
