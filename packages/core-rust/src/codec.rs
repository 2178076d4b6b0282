//! Record serialization for the cache tiers.
//!
//! A [`Codec`] converts a record to and from a self-describing byte payload.
//! The payload length is the record's cached byte size, so the codec also
//! determines size accounting and oversized-item routing downstream.
//!
//! [`JsonCodec`] is the default implementation: JSON is self-describing,
//! human-inspectable in the database file, and tolerant of unknown fields,
//! which keeps stale-payload failures clean decode errors rather than
//! undefined behavior.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors produced while converting records to or from bytes.
///
/// `Decode` covers both corrupt payloads and payloads written by an
/// incompatible record shape; the engine treats either as a recoverable
/// read miss, never as a caller-visible failure.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The record could not be serialized.
    #[error("record could not be encoded")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The payload could not be deserialized into the registered type.
    #[error("payload could not be decoded")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Converts records of type `T` to and from byte payloads.
///
/// Implementations must round-trip: `decode(encode(r))` yields a record
/// equal to `r` for every record the codec accepts.
///
/// Used as `Arc<dyn Codec<T>>`.
pub trait Codec<T>: Send + Sync {
    /// Serializes a record into a self-describing byte payload.
    fn encode(&self, record: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes a payload, failing cleanly on corrupt or incompatible bytes.
    fn decode(&self, payload: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec for any serde-serializable record type.
pub struct JsonCodec<T> {
    // `fn() -> T` keeps the codec Send + Sync without requiring it of `T`.
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Creates a new `JsonCodec`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, record: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(record).map_err(|err| CodecError::Encode(Box::new(err)))
    }

    fn decode(&self, payload: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(payload).map_err(|err| CodecError::Decode(Box::new(err)))
    }
}
