//! Strata Engine -- two-tier record cache with an embedded `SQLite` backing store.

pub mod cache;

pub use cache::{
    CacheConfig, CacheError, CacheResult, DiskRow, DiskStore, MemoryEntry, MemoryIndex,
    PolicyEntry, SqliteStore, StatsSnapshot, TieredCache, MEMORY_PATH,
};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
