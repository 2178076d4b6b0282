//! Engine configuration.

use crate::cache::error::{CacheError, CacheResult};
use crate::cache::stores::sqlite::MEMORY_PATH;

/// Constructor-time configuration for a [`TieredCache`](crate::cache::TieredCache).
///
/// Each tier carries independent count, byte, and TTL budgets. A TTL of
/// `0.0` (or any non-positive value) disables expiry for that tier.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Filesystem path of the backing database, or [`MEMORY_PATH`]
    /// (`":memory:"`) for an ephemeral store.
    pub db_path: String,
    /// Memory tier entry-count budget.
    pub max_memory_items: u64,
    /// Memory tier byte budget.
    pub max_memory_size_bytes: u64,
    /// Disk tier entry-count budget.
    pub max_disk_items: u64,
    /// Disk tier byte budget.
    pub max_disk_size_bytes: u64,
    /// Sliding TTL for memory entries, in seconds. Non-positive = no expiry.
    pub memory_ttl_seconds: f64,
    /// Sliding TTL for disk rows, in seconds. Non-positive = no expiry.
    pub disk_ttl_seconds: f64,
    /// Serialized-size threshold above which an item is stored disk-only.
    pub max_item_size_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: MEMORY_PATH.to_string(),
            max_memory_items: 1024,
            max_memory_size_bytes: 16 * 1024 * 1024,
            max_disk_items: 16 * 1024,
            max_disk_size_bytes: 256 * 1024 * 1024,
            memory_ttl_seconds: 0.0,
            disk_ttl_seconds: 0.0,
            max_item_size_bytes: 1024 * 1024,
        }
    }
}

impl CacheConfig {
    /// Checks the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for an empty `db_path` or a
    /// non-finite TTL.
    pub fn validate(&self) -> CacheResult<()> {
        if self.db_path.is_empty() {
            return Err(CacheError::Config {
                reason: "db_path must not be empty".to_string(),
            });
        }
        if !self.memory_ttl_seconds.is_finite() || !self.disk_ttl_seconds.is_finite() {
            return Err(CacheError::Config {
                reason: "TTL values must be finite".to_string(),
            });
        }
        Ok(())
    }
}
