//! Engine statistics.
//!
//! Monotonic counters survive `clear()`; the tier gauges are read live
//! from the tiers when a snapshot is taken. Counters are credited only
//! after the observable effect succeeded, under the same exclusion as the
//! state change itself.

/// Cumulative operation counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub memory_evictions: u64,
    pub disk_evictions: u64,
    pub total_puts: u64,
    pub total_gets: u64,
    pub total_deletes: u64,
}

impl Counters {
    /// Combines the counters with live tier gauges into a snapshot.
    pub fn snapshot(
        &self,
        current_memory_items: u64,
        current_memory_bytes: u64,
        current_disk_items: u64,
        current_disk_bytes: u64,
    ) -> StatsSnapshot {
        StatsSnapshot {
            memory_hits: self.memory_hits,
            disk_hits: self.disk_hits,
            misses: self.misses,
            memory_evictions: self.memory_evictions,
            disk_evictions: self.disk_evictions,
            total_puts: self.total_puts,
            total_gets: self.total_gets,
            total_deletes: self.total_deletes,
            current_memory_items,
            current_memory_bytes,
            current_disk_items,
            current_disk_bytes,
        }
    }
}

/// Point-in-time view of the engine's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Gets answered from the memory tier.
    pub memory_hits: u64,
    /// Gets answered from the disk tier.
    pub disk_hits: u64,
    /// Gets (including expired/stale/corrupt reads) answered by nothing.
    pub misses: u64,
    /// Entries dropped from memory by the budget policy.
    pub memory_evictions: u64,
    /// Rows dropped from disk by the budget policy.
    pub disk_evictions: u64,
    /// Records written, counting each batch item.
    pub total_puts: u64,
    /// Keys read, counting each batch item.
    pub total_gets: u64,
    /// Keys deleted, counting each batch item.
    pub total_deletes: u64,
    /// Entries currently resident in memory.
    pub current_memory_items: u64,
    /// Bytes currently resident in memory.
    pub current_memory_bytes: u64,
    /// Rows currently on disk.
    pub current_disk_items: u64,
    /// Bytes currently on disk.
    pub current_disk_bytes: u64,
}
