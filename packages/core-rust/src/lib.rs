//! Strata Core -- record model, codec, and clock contracts.
//!
//! This crate provides the collaborator contracts consumed by the Strata
//! cache engine:
//!
//! - **Clock** ([`clock`]): `ClockSource` abstraction + `SystemClock` default
//! - **Codec** ([`codec`]): `Codec<T>` byte conversion, `JsonCodec`, `CodecError`
//! - **Model** ([`model`]): `RecordModel<T>` -- registered type + schema version

pub mod clock;
pub mod codec;
pub mod model;

// Clock
pub use clock::{ClockSource, SystemClock};

// Codec
pub use codec::{Codec, CodecError, JsonCodec};

// Model
pub use model::RecordModel;
