//! Embedded `SQLite` implementation of [`DiskStore`].
//!
//! One table holds the engine instance's rows; the schema is created
//! idempotently on open. File-backed databases run in WAL mode with
//! `synchronous=NORMAL` for durable writes and concurrent readers.
//! The reserved path [`MEMORY_PATH`] selects an ephemeral in-memory
//! database instead.

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::cache::disk_store::DiskStore;
use crate::cache::entry::DiskRow;
use crate::cache::error::CacheResult;
use crate::cache::policy::PolicyEntry;

/// Reserved path selecting an ephemeral in-memory backing store.
pub const MEMORY_PATH: &str = ":memory:";

/// The cache table and its eviction-scan index.
///
/// `byte_size` is persisted alongside the payload so size accounting and
/// victim selection never read the blob column.
const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key            TEXT PRIMARY KEY NOT NULL,
        payload        BLOB NOT NULL,
        byte_size      INTEGER NOT NULL,
        last_access_ts REAL NOT NULL,
        schema_version TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_cache_entries_last_access
        ON cache_entries(last_access_ts);
";

/// `SQLite`-backed [`DiskStore`].
///
/// The connection is owned exclusively by the engine instance; the mutex
/// exists so the store satisfies `Send + Sync`, not for cross-instance
/// sharing.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path` and initializes the schema.
    ///
    /// `":memory:"` selects an ephemeral database that lives and dies with
    /// this store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Disk`](crate::cache::CacheError::Disk) when
    /// the database cannot be opened or initialized.
    pub fn open(path: &str) -> CacheResult<Self> {
        let conn = if path == MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(path)?;
            // WAL is meaningless for in-memory databases, hence file-only.
            conn.pragma_update(None, "journal_mode", "wal")?;
            conn.pragma_update(None, "synchronous", "normal")?;
            conn
        };
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

// Row sizes are payload lengths; they fit i64 (and back) comfortably.
#[allow(clippy::cast_sign_loss)]
fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiskRow> {
    Ok(DiskRow {
        key: row.get(0)?,
        payload: row.get(1)?,
        byte_size: row.get::<_, i64>(2)? as u64,
        last_access_ts: row.get(3)?,
        schema_version: row.get(4)?,
    })
}

#[allow(clippy::cast_possible_wrap)]
fn size_param(byte_size: u64) -> i64 {
    byte_size as i64
}

const UPSERT_SQL: &str = "
    INSERT INTO cache_entries (key, payload, byte_size, last_access_ts, schema_version)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(key) DO UPDATE SET
        payload        = excluded.payload,
        byte_size      = excluded.byte_size,
        last_access_ts = excluded.last_access_ts,
        schema_version = excluded.schema_version
";

impl DiskStore for SqliteStore {
    fn upsert(&self, row: &DiskRow) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            UPSERT_SQL,
            params![
                row.key,
                row.payload,
                size_param(row.byte_size),
                row.last_access_ts,
                row.schema_version,
            ],
        )?;
        Ok(())
    }

    fn upsert_many(&self, rows: &[DiskRow]) -> CacheResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for row in rows {
                stmt.execute(params![
                    row.key,
                    row.payload,
                    size_param(row.byte_size),
                    row.last_access_ts,
                    row.schema_version,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<DiskRow>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT key, payload, byte_size, last_access_ts, schema_version
                 FROM cache_entries WHERE key = ?1",
                params![key],
                read_row,
            )
            .optional()?;
        Ok(row)
    }

    fn get_many(&self, keys: &[String]) -> CacheResult<Vec<DiskRow>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT key, payload, byte_size, last_access_ts, schema_version
             FROM cache_entries WHERE key IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(keys.iter()), read_row)?;
        let mut result = Vec::with_capacity(keys.len());
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }

    fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let conn = self.conn.lock();
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!("DELETE FROM cache_entries WHERE key IN ({placeholders})");
        let changed = conn.execute(&sql, params_from_iter(keys.iter()))?;
        Ok(changed as u64)
    }

    fn touch(&self, key: &str, ts: f64) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE cache_entries SET last_access_ts = ?2 WHERE key = ?1",
            params![key, ts],
        )?;
        Ok(())
    }

    #[allow(clippy::cast_sign_loss)]
    fn policy_entries(&self) -> CacheResult<Vec<PolicyEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT key, last_access_ts, byte_size
             FROM cache_entries ORDER BY last_access_ts ASC, key ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PolicyEntry {
                key: row.get(0)?,
                last_access_ts: row.get(1)?,
                byte_size: row.get::<_, i64>(2)? as u64,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    #[allow(clippy::cast_sign_loss)]
    fn count(&self) -> CacheResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    #[allow(clippy::cast_sign_loss)]
    fn total_bytes(&self) -> CacheResult<u64> {
        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(byte_size), 0) FROM cache_entries",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    fn clear(&self) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }
}
