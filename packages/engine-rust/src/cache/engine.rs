//! Two-tier cache coordinator.
//!
//! [`TieredCache`] is the front door. It orders every operation across the
//! memory and disk tiers: write-through on put, read-through with
//! promotion on get, oversized routing to disk only, lazy TTL expiry,
//! budget eviction with disk-to-memory cascade, and statistics.
//!
//! A single reader-writer lock protects the union of memory index, disk
//! handle, and counters. Read-only operations (`exists`, the gauges,
//! `get_stats`) take shared access; everything that can mutate state --
//! including `get`, which refreshes access times and drops stale rows --
//! takes exclusive access for its full duration, so external observers
//! never see a partially applied operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use strata_core::{ClockSource, RecordModel, SystemClock};

use crate::cache::config::CacheConfig;
use crate::cache::disk_store::DiskStore;
use crate::cache::entry::{DiskRow, MemoryEntry};
use crate::cache::error::{validate_batch_keys, validate_key, CacheError, CacheResult};
use crate::cache::memory_index::MemoryIndex;
use crate::cache::policy;
use crate::cache::stats::{Counters, StatsSnapshot};
use crate::cache::stores::sqlite::SqliteStore;

/// Two-tier record cache: a memory index in front of an embedded SQL store.
///
/// Every operation that takes a timestamp comes in two forms: the plain
/// form reads the clock once at operation entry, and the `*_at` form takes
/// an injected timestamp for deterministic replay in tests. The same value
/// drives every internal state change of that call.
///
/// After [`close()`](TieredCache::close), all operations return
/// [`CacheError::Closed`].
pub struct TieredCache<T> {
    inner: RwLock<Option<EngineInner<T>>>,
    clock: Arc<dyn ClockSource>,
}

struct EngineInner<T> {
    config: CacheConfig,
    model: RecordModel<T>,
    memory: MemoryIndex<T>,
    disk: Box<dyn DiskStore>,
    counters: Counters,
}

impl<T> TieredCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Opens the cache with the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for an unusable configuration and
    /// [`CacheError::Disk`] when the backing database cannot be opened.
    pub fn open(config: CacheConfig, model: RecordModel<T>) -> CacheResult<Self> {
        Self::open_with_clock(config, model, Arc::new(SystemClock))
    }

    /// Opens the cache with an injected clock source.
    ///
    /// # Errors
    ///
    /// Same as [`open()`](TieredCache::open).
    pub fn open_with_clock(
        config: CacheConfig,
        model: RecordModel<T>,
        clock: Arc<dyn ClockSource>,
    ) -> CacheResult<Self> {
        config.validate()?;
        let disk: Box<dyn DiskStore> = Box::new(SqliteStore::open(&config.db_path)?);
        tracing::debug!(
            db_path = %config.db_path,
            model = model.name(),
            schema_version = model.schema_version(),
            "cache opened"
        );
        Ok(Self {
            inner: RwLock::new(Some(EngineInner {
                config,
                model,
                memory: MemoryIndex::new(),
                disk,
                counters: Counters::default(),
            })),
            clock,
        })
    }

    /// Reads a record, refreshing its sliding-TTL window on a hit.
    ///
    /// Memory is consulted first; on a miss the disk row is checked for
    /// TTL expiry and schema-version match, refreshed, and promoted into
    /// memory unless oversized. Expired, stale-version, and corrupt rows
    /// are deleted and reported as a miss.
    pub fn get(&self, key: &str) -> CacheResult<Option<T>> {
        self.get_at(key, self.clock.now())
    }

    /// [`get()`](TieredCache::get) with an injected timestamp.
    pub fn get_at(&self, key: &str, ts: f64) -> CacheResult<Option<T>> {
        validate_key(key)?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.get_at(key, ts)
    }

    /// Writes a record through to both tiers.
    ///
    /// The record is serialized first; items larger than
    /// `max_item_size_bytes` are stored disk-only. Both tiers are brought
    /// back within budget before the call returns, with disk evictions
    /// cascading into memory.
    pub fn put(&self, key: &str, record: T) -> CacheResult<()> {
        self.put_at(key, record, self.clock.now())
    }

    /// [`put()`](TieredCache::put) with an injected timestamp.
    pub fn put_at(&self, key: &str, record: T, ts: f64) -> CacheResult<()> {
        validate_key(key)?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.put_at(key, record, ts)
    }

    /// Removes a key from both tiers.
    pub fn delete(&self, key: &str) -> CacheResult<()> {
        validate_key(key)?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.delete(key)
    }

    /// Whether a live (non-expired, version-matching) entry exists.
    ///
    /// Strictly read-only: no access refresh, no lazy deletion.
    pub fn exists(&self, key: &str) -> CacheResult<bool> {
        self.exists_at(key, self.clock.now())
    }

    /// [`exists()`](TieredCache::exists) with an injected timestamp.
    pub fn exists_at(&self, key: &str, ts: f64) -> CacheResult<bool> {
        validate_key(key)?;
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(CacheError::Closed)?;
        inner.exists_at(key, ts)
    }

    /// Reads a batch of keys, returning the records that were found.
    ///
    /// Keys missed in memory are fetched from disk in a single query.
    /// Batch reads leave LRU state untouched on both tiers: no access
    /// refresh happens, and promotions keep the stored access time.
    /// Expired, stale, and corrupt rows encountered are still deleted.
    pub fn get_many(&self, keys: &[String]) -> CacheResult<HashMap<String, T>> {
        self.get_many_at(keys, self.clock.now())
    }

    /// [`get_many()`](TieredCache::get_many) with an injected timestamp.
    pub fn get_many_at(&self, keys: &[String], ts: f64) -> CacheResult<HashMap<String, T>> {
        validate_batch_keys(keys.iter().map(String::as_str))?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.get_many_at(keys, ts)
    }

    /// Writes a batch of records, all or nothing.
    ///
    /// Every key is validated and every record serialized before any state
    /// changes; the disk upsert is a single transaction. A failure leaves
    /// both tiers exactly as they were.
    pub fn put_many(&self, items: Vec<(String, T)>) -> CacheResult<()> {
        self.put_many_at(items, self.clock.now())
    }

    /// [`put_many()`](TieredCache::put_many) with an injected timestamp.
    pub fn put_many_at(&self, items: Vec<(String, T)>, ts: f64) -> CacheResult<()> {
        validate_batch_keys(items.iter().map(|(key, _)| key.as_str()))?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.put_many_at(items, ts)
    }

    /// Removes a batch of keys from both tiers; the disk delete is a
    /// single transaction.
    pub fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        validate_batch_keys(keys.iter().map(String::as_str))?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.delete_many(keys)
    }

    /// Truncates both tiers. Cumulative counters are retained.
    pub fn clear(&self) -> CacheResult<()> {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CacheError::Closed)?;
        inner.disk.clear()?;
        inner.memory.clear();
        tracing::debug!("cache cleared");
        Ok(())
    }

    /// Number of records in the cache (the disk tier is authoritative:
    /// every record is written through to it).
    pub fn get_count(&self) -> CacheResult<u64> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(CacheError::Closed)?;
        inner.disk.count()
    }

    /// Total serialized size of the cached records, in bytes.
    pub fn get_total_size(&self) -> CacheResult<u64> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(CacheError::Closed)?;
        inner.disk.total_bytes()
    }

    /// Snapshot of the cumulative counters and current tier gauges.
    pub fn get_stats(&self) -> CacheResult<StatsSnapshot> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(CacheError::Closed)?;
        inner.stats()
    }

    /// Releases the memory index and the disk handle. Idempotent; every
    /// operation after the first `close` returns [`CacheError::Closed`].
    pub fn close(&self) {
        let mut guard = self.inner.write();
        if guard.take().is_some() {
            tracing::debug!("cache closed");
        }
    }
}

impl<T> EngineInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get_at(&mut self, key: &str, ts: f64) -> CacheResult<Option<T>> {
        // Step 1: memory tier.
        if let Some(entry) = self.memory.get_mut(key) {
            let live = !policy::is_expired(entry.last_access_ts, self.config.memory_ttl_seconds, ts)
                && entry.schema_version == self.model.schema_version();
            if live {
                entry.touch(ts);
                let record = entry.record.clone();
                self.counters.total_gets += 1;
                self.counters.memory_hits += 1;
                return Ok(Some(record));
            }
            // Expired or stale-version entry: drop it, let the disk row decide.
            self.memory.remove(key);
        }

        // Step 2: disk tier.
        let Some(row) = self.disk.get(key)? else {
            self.counters.total_gets += 1;
            self.counters.misses += 1;
            return Ok(None);
        };

        if policy::is_expired(row.last_access_ts, self.config.disk_ttl_seconds, ts) {
            self.disk.delete(key)?;
            tracing::debug!(key, "expired row dropped from disk on access");
            self.counters.total_gets += 1;
            self.counters.misses += 1;
            return Ok(None);
        }

        if row.schema_version != self.model.schema_version() {
            self.disk.delete(key)?;
            tracing::warn!(
                key,
                stored = %row.schema_version,
                current = %self.model.schema_version(),
                "schema version mismatch, row invalidated"
            );
            self.counters.total_gets += 1;
            self.counters.misses += 1;
            return Ok(None);
        }

        let record = match self.model.decode(&row.payload) {
            Ok(record) => record,
            Err(err) => {
                self.disk.delete(key)?;
                tracing::warn!(key, error = %err, "corrupt row dropped from disk");
                self.counters.total_gets += 1;
                self.counters.misses += 1;
                return Ok(None);
            }
        };

        // Disk hit: refresh the row and promote unless oversized.
        self.disk.touch(key, ts)?;
        if row.byte_size <= self.config.max_item_size_bytes {
            self.memory.insert(
                key.to_string(),
                MemoryEntry {
                    record: record.clone(),
                    byte_size: row.byte_size,
                    last_access_ts: ts,
                    schema_version: row.schema_version,
                },
            );
            self.evict_memory();
        }
        self.counters.total_gets += 1;
        self.counters.disk_hits += 1;
        Ok(Some(record))
    }

    fn put_at(&mut self, key: &str, record: T, ts: f64) -> CacheResult<()> {
        let payload = self
            .model
            .encode(&record)
            .map_err(|source| CacheError::Encode {
                key: key.to_string(),
                source,
            })?;
        let byte_size = payload.len() as u64;
        let schema_version = self.model.schema_version().to_string();

        // Disk commits first: a surfaced disk failure must leave both
        // tiers untouched.
        self.disk.upsert(&DiskRow {
            key: key.to_string(),
            payload,
            byte_size,
            last_access_ts: ts,
            schema_version: schema_version.clone(),
        })?;

        if byte_size <= self.config.max_item_size_bytes {
            self.memory.insert(
                key.to_string(),
                MemoryEntry {
                    record,
                    byte_size,
                    last_access_ts: ts,
                    schema_version,
                },
            );
        } else {
            // Oversized: disk-only, and any smaller predecessor leaves memory.
            self.memory.remove(key);
            tracing::debug!(key, byte_size, "oversized record routed disk-only");
        }

        self.evict_memory();
        self.evict_disk()?;
        self.counters.total_puts += 1;
        Ok(())
    }

    fn put_many_at(&mut self, items: Vec<(String, T)>, ts: f64) -> CacheResult<()> {
        let schema_version = self.model.schema_version().to_string();

        // Serialize everything before any state change: a failure here
        // aborts the batch with both tiers untouched.
        let mut rows = Vec::with_capacity(items.len());
        let mut resident = Vec::with_capacity(items.len());
        for (key, record) in items {
            let payload = self
                .model
                .encode(&record)
                .map_err(|source| CacheError::Encode {
                    key: key.clone(),
                    source,
                })?;
            let byte_size = payload.len() as u64;
            rows.push(DiskRow {
                key: key.clone(),
                payload,
                byte_size,
                last_access_ts: ts,
                schema_version: schema_version.clone(),
            });
            resident.push((key, record, byte_size));
        }

        let batch = rows.len() as u64;
        self.disk.upsert_many(&rows)?;
        for (key, record, byte_size) in resident {
            if byte_size <= self.config.max_item_size_bytes {
                self.memory.insert(
                    key,
                    MemoryEntry {
                        record,
                        byte_size,
                        last_access_ts: ts,
                        schema_version: schema_version.clone(),
                    },
                );
            } else {
                self.memory.remove(&key);
            }
        }

        // Policy runs once per tier, not per item.
        self.evict_memory();
        self.evict_disk()?;
        self.counters.total_puts += batch;
        Ok(())
    }

    fn get_many_at(&mut self, keys: &[String], ts: f64) -> CacheResult<HashMap<String, T>> {
        let mut result = HashMap::with_capacity(keys.len());
        let mut memory_hits: u64 = 0;
        let mut missed: Vec<String> = Vec::new();

        for key in keys {
            let lookup = self.memory.get(key).map(|entry| {
                let live = !policy::is_expired(
                    entry.last_access_ts,
                    self.config.memory_ttl_seconds,
                    ts,
                ) && entry.schema_version == self.model.schema_version();
                live.then(|| entry.record.clone())
            });
            match lookup {
                Some(Some(record)) => {
                    result.insert(key.clone(), record);
                    memory_hits += 1;
                }
                Some(None) => {
                    // Expired or stale in memory; the disk row decides.
                    self.memory.remove(key);
                    missed.push(key.clone());
                }
                None => missed.push(key.clone()),
            }
        }

        let mut disk_hits: u64 = 0;
        if !missed.is_empty() {
            let mut dead_rows: Vec<String> = Vec::new();
            let mut promoted = false;
            for row in self.disk.get_many(&missed)? {
                if policy::is_expired(row.last_access_ts, self.config.disk_ttl_seconds, ts) {
                    dead_rows.push(row.key);
                    continue;
                }
                if row.schema_version != self.model.schema_version() {
                    tracing::warn!(
                        key = %row.key,
                        stored = %row.schema_version,
                        "schema version mismatch, row invalidated"
                    );
                    dead_rows.push(row.key);
                    continue;
                }
                match self.model.decode(&row.payload) {
                    Ok(record) => {
                        if row.byte_size <= self.config.max_item_size_bytes {
                            // Promote with the stored access time: batch
                            // reads leave LRU state untouched.
                            self.memory.insert(
                                row.key.clone(),
                                MemoryEntry {
                                    record: record.clone(),
                                    byte_size: row.byte_size,
                                    last_access_ts: row.last_access_ts,
                                    schema_version: row.schema_version,
                                },
                            );
                            promoted = true;
                        }
                        result.insert(row.key, record);
                        disk_hits += 1;
                    }
                    Err(err) => {
                        tracing::warn!(key = %row.key, error = %err, "corrupt row dropped from disk");
                        dead_rows.push(row.key);
                    }
                }
            }
            if !dead_rows.is_empty() {
                self.disk.delete_many(&dead_rows)?;
            }
            if promoted {
                self.evict_memory();
            }
        }

        self.counters.total_gets += keys.len() as u64;
        self.counters.memory_hits += memory_hits;
        self.counters.disk_hits += disk_hits;
        self.counters.misses += keys.len() as u64 - memory_hits - disk_hits;
        Ok(result)
    }

    fn delete(&mut self, key: &str) -> CacheResult<()> {
        self.disk.delete(key)?;
        self.memory.remove(key);
        self.counters.total_deletes += 1;
        Ok(())
    }

    fn delete_many(&mut self, keys: &[String]) -> CacheResult<()> {
        self.disk.delete_many(keys)?;
        for key in keys {
            self.memory.remove(key);
        }
        self.counters.total_deletes += keys.len() as u64;
        Ok(())
    }

    fn exists_at(&self, key: &str, ts: f64) -> CacheResult<bool> {
        if let Some(entry) = self.memory.get(key) {
            let live = !policy::is_expired(entry.last_access_ts, self.config.memory_ttl_seconds, ts)
                && entry.schema_version == self.model.schema_version();
            if live {
                return Ok(true);
            }
        }
        match self.disk.get(key)? {
            Some(row) => Ok(!policy::is_expired(
                row.last_access_ts,
                self.config.disk_ttl_seconds,
                ts,
            ) && row.schema_version == self.model.schema_version()),
            None => Ok(false),
        }
    }

    fn evict_memory(&mut self) {
        let victims = policy::select_victims(
            self.memory.policy_entries(),
            self.config.max_memory_items,
            self.config.max_memory_size_bytes,
        );
        if victims.is_empty() {
            return;
        }
        for key in &victims {
            self.memory.remove(key);
        }
        self.counters.memory_evictions += victims.len() as u64;
        tracing::debug!(evicted = victims.len(), "memory budget eviction");
    }

    fn evict_disk(&mut self) -> CacheResult<()> {
        if self.disk.count()? <= self.config.max_disk_items
            && self.disk.total_bytes()? <= self.config.max_disk_size_bytes
        {
            return Ok(());
        }
        let victims = policy::select_victims(
            self.disk.policy_entries()?,
            self.config.max_disk_items,
            self.config.max_disk_size_bytes,
        );
        if victims.is_empty() {
            return Ok(());
        }
        self.disk.delete_many(&victims)?;
        for key in &victims {
            // Disk eviction cascades into memory (never the other way).
            self.memory.remove(key);
        }
        self.counters.disk_evictions += victims.len() as u64;
        tracing::debug!(evicted = victims.len(), "disk budget eviction");
        Ok(())
    }

    fn stats(&self) -> CacheResult<StatsSnapshot> {
        Ok(self.counters.snapshot(
            self.memory.len() as u64,
            self.memory.total_bytes(),
            self.disk.count()?,
            self.disk.total_bytes()?,
        ))
    }
}
