//! Registered record types.
//!
//! A [`RecordModel`] is the unit of registration the cache engine is built
//! around: it names a record type, pins the schema version its payloads are
//! written under, and carries the [`Codec`] that converts records to and
//! from bytes. The engine is generic over the model's record type, so a
//! `put` of a value outside the registered type does not compile; the
//! runtime type-identity check collapses into the type system.
//!
//! Schema versions are opaque strings compared by exact equality. A version
//! bump is expressed by constructing a new model (and reopening the engine
//! over the same database file); payloads written under the old version are
//! then invalidated lazily on read.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Codec, CodecError, JsonCodec};

/// A registered record type: name, schema version, and codec.
pub struct RecordModel<T> {
    name: String,
    schema_version: String,
    codec: Arc<dyn Codec<T>>,
}

impl<T> Clone for RecordModel<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema_version: self.schema_version.clone(),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<T> std::fmt::Debug for RecordModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordModel")
            .field("name", &self.name)
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl<T> RecordModel<T> {
    /// Creates a model with an explicit codec.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        schema_version: impl Into<String>,
        codec: Arc<dyn Codec<T>>,
    ) -> Self {
        Self {
            name: name.into(),
            schema_version: schema_version.into(),
            codec,
        }
    }

    /// The model's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema version current payloads are written under.
    #[must_use]
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Serializes a record through the model's codec.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the record cannot be serialized.
    pub fn encode(&self, record: &T) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(record)
    }

    /// Deserializes a payload through the model's codec.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] on corrupt or incompatible payloads.
    pub fn decode(&self, payload: &[u8]) -> Result<T, CodecError> {
        self.codec.decode(payload)
    }
}

impl<T> RecordModel<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Creates a model backed by the default [`JsonCodec`].
    #[must_use]
    pub fn json(name: impl Into<String>, schema_version: impl Into<String>) -> Self {
        Self::new(name, schema_version, Arc::new(JsonCodec::new()))
    }
}
