//! Onex Envelope
//!
//! Transport wrappers and serializers. An [`Envelope`] pairs a payload with its
//! type and correlation id; [`create_envelope`] and [`extract_payload`] are
//! inverses for any serde payload. [`Serializer`] turns states, results and
//! envelopes into wire data, reporting failures as a [`SerializationResult`]
//! rather than an error.

mod envelope;
mod error;
mod serializer;

pub use envelope::{Envelope, create_envelope, extract_payload};
pub use error::EnvelopeError;
pub use serializer::{
  JsonSerializer, SerializationResult, Serializer, decode, decode_envelope, encode,
};
