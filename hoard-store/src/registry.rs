//! Named-pool registry.
//!
//! The host process registers each pool under a name; the orchestration
//! layer (a CLI, a scheduler) resolves names here, filters to the pools
//! that advertise prune capability, and sweeps them in order. This module
//! is that boundary expressed as a library API.

use std::collections::BTreeMap;
use std::sync::Arc;

use hoard_core::{RegistryError, StoreError};

use crate::pool::CachePool;

/// Result of sweeping one pool during a multi-pool prune.
///
/// One pool's sweep failing does not abort the remaining pools; its error
/// travels in `result` instead.
#[derive(Debug)]
pub struct PruneOutcome {
    pub name: String,
    pub result: Result<u64, StoreError>,
}

/// Registry of named cache pools.
#[derive(Default)]
pub struct PoolRegistry {
    pools: BTreeMap<String, Arc<dyn CachePool>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool under `name`. Re-registering a name replaces the
    /// previous pool.
    pub fn register(&mut self, name: impl Into<String>, pool: Arc<dyn CachePool>) {
        self.pools.insert(name.into(), pool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CachePool>> {
        self.pools.get(name).cloned()
    }

    /// All registered pool names, sorted.
    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    /// Names of pools advertising prune capability, sorted.
    pub fn pruneable_names(&self) -> Vec<&str> {
        self.pools
            .iter()
            .filter(|(_, pool)| pool.as_pruneable().is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Prune the named pools in the order given, or every pruneable pool
    /// when `names` is empty.
    ///
    /// Name resolution is all-or-nothing and happens before any sweeping:
    /// a name that is unregistered or names a non-pruneable pool fails the
    /// whole call. An empty final selection is an error, matching the
    /// "nothing to do" condition a caller wants surfaced.
    pub fn prune(&self, names: &[&str]) -> Result<Vec<PruneOutcome>, RegistryError> {
        let selected: Vec<(String, Arc<dyn CachePool>)> = if names.is_empty() {
            self.pools
                .iter()
                .filter(|(_, pool)| pool.as_pruneable().is_some())
                .map(|(name, pool)| (name.clone(), pool.clone()))
                .collect()
        } else {
            names
                .iter()
                .map(|&name| {
                    let pool = self
                        .pools
                        .get(name)
                        .filter(|pool| pool.as_pruneable().is_some())
                        .ok_or_else(|| RegistryError::UnknownPool {
                            name: name.to_string(),
                        })?;
                    Ok((name.to_string(), pool.clone()))
                })
                .collect::<Result<_, RegistryError>>()?
        };

        if selected.is_empty() {
            return Err(RegistryError::NoPruneablePools);
        }

        let mut outcomes = Vec::with_capacity(selected.len());
        for (name, pool) in selected {
            let Some(pruneable) = pool.as_pruneable() else {
                // Capability checked during selection; a pool cannot lose it.
                continue;
            };
            tracing::info!(pool = %name, "pruning cache pool");
            outcomes.push(PruneOutcome {
                result: pruneable.prune(),
                name,
            });
        }
        Ok(outcomes)
    }
}
