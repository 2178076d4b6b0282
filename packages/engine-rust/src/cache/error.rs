//! Error taxonomy for the cache engine.
//!
//! Client faults (invalid key, duplicate batch key, encode failure, use
//! after close) are raised to the caller. Disk failures are surfaced as
//! [`CacheError::Disk`]. Corrupt rows and schema mismatches discovered on
//! the read path are recovered locally by deletion-and-miss and never
//! reach the caller.

use strata_core::CodecError;

/// Errors returned by the public cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The supplied key is malformed (empty).
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// The same key appeared more than once in a batch operation.
    #[error("duplicate key in batch: {key}")]
    DuplicateKey {
        /// The offending key.
        key: String,
    },

    /// The record for `key` could not be serialized. For batch puts this
    /// is raised before any state change.
    #[error("record for key {key} could not be serialized")]
    Encode {
        /// The key whose record failed to encode.
        key: String,
        /// The underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The engine configuration is unusable.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The backing store failed during a read or write. Multi-row
    /// mutations roll back; no partial batch is committed.
    #[error("disk store error")]
    Disk(#[from] rusqlite::Error),

    /// The operation was invoked after `close()`.
    #[error("cache engine is closed")]
    Closed,
}

/// Result alias used throughout the engine.
pub type CacheResult<T> = Result<T, CacheError>;

/// Validates a key: non-empty, or [`CacheError::InvalidKey`].
pub(crate) fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            reason: "key must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Validates a batch of keys: each key valid, no duplicates.
pub(crate) fn validate_batch_keys<'a, I>(keys: I) -> CacheResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for key in keys {
        validate_key(key)?;
        if !seen.insert(key) {
            return Err(CacheError::DuplicateKey {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_invalid() {
        let err = validate_key("").unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
    }

    #[test]
    fn non_empty_key_is_valid() {
        assert!(validate_key("k").is_ok());
    }

    #[test]
    fn batch_rejects_duplicates() {
        let err = validate_batch_keys(["a", "b", "a"]).unwrap_err();
        match err {
            CacheError::DuplicateKey { key } => assert_eq!(key, "a"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn batch_rejects_empty_key_before_duplicates() {
        let err = validate_batch_keys(["x", "", "x"]).unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
    }

    #[test]
    fn batch_accepts_distinct_keys() {
        assert!(validate_batch_keys(["a", "b", "c"]).is_ok());
    }
}
