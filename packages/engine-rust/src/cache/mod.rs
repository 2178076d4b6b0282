//! Two-tier caching engine.
//!
//! Provides the component hierarchy for the tiered cache:
//!
//! - **Memory tier** ([`MemoryIndex`]): in-process map of deserialized
//!   records with per-entry access metadata and O(1) size accounting
//! - **Disk tier** ([`DiskStore`] / [`SqliteStore`]): embedded SQL-backed
//!   keyed blob store with atomic multi-row mutations
//! - **Policy** ([`policy`]): pure TTL and LRU eviction functions applied
//!   uniformly to both tiers
//! - **Coordinator** ([`TieredCache`]): the front door -- write-through
//!   puts, read-through gets with promotion, oversized routing, statistics,
//!   and the engine-wide exclusion discipline

pub mod config;
pub mod disk_store;
pub mod engine;
pub mod entry;
pub mod error;
pub mod memory_index;
pub mod policy;
pub mod stats;
pub mod stores;

pub use config::CacheConfig;
pub use disk_store::DiskStore;
pub use engine::TieredCache;
pub use entry::{DiskRow, MemoryEntry};
pub use error::{CacheError, CacheResult};
pub use memory_index::MemoryIndex;
pub use policy::PolicyEntry;
pub use stats::StatsSnapshot;
pub use stores::sqlite::{SqliteStore, MEMORY_PATH};
