//! [`DiskStore`](crate::cache::DiskStore) implementations.

pub mod sqlite;

pub use sqlite::{SqliteStore, MEMORY_PATH};
