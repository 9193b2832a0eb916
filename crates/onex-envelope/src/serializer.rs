use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::EnvelopeError;

/// Outcome of a serialization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationResult {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
}

impl SerializationResult {
  pub fn ok(data: String) -> Self {
    Self {
      success: true,
      data: Some(data),
      error_message: None,
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      data: None,
      error_message: Some(message.into()),
    }
  }
}

/// Encodes values for persistence or transmission.
///
/// Used to ship states, results and envelopes across process boundaries;
/// reducers never call it.
pub trait Serializer: Send + Sync {
  /// Short name of the wire format, e.g. `"json"`.
  fn format(&self) -> &'static str;

  fn serialize(&self, value: &serde_json::Value) -> SerializationResult;

  fn deserialize(&self, data: &str) -> Result<serde_json::Value, EnvelopeError>;
}

/// JSON serializer, compact by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
  pretty: bool,
}

impl JsonSerializer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pretty() -> Self {
    Self { pretty: true }
  }
}

impl Serializer for JsonSerializer {
  fn format(&self) -> &'static str {
    "json"
  }

  fn serialize(&self, value: &serde_json::Value) -> SerializationResult {
    let encoded = if self.pretty {
      serde_json::to_string_pretty(value)
    } else {
      serde_json::to_string(value)
    };

    match encoded {
      Ok(data) => SerializationResult::ok(data),
      Err(e) => SerializationResult::failed(e.to_string()),
    }
  }

  fn deserialize(&self, data: &str) -> Result<serde_json::Value, EnvelopeError> {
    serde_json::from_str(data).map_err(EnvelopeError::Malformed)
  }
}

/// Serialize any serde value (state, result, action) through `serializer`.
pub fn encode<T: Serialize + ?Sized>(serializer: &dyn Serializer, value: &T) -> SerializationResult {
  match serde_json::to_value(value) {
    Ok(value) => serializer.serialize(&value),
    Err(e) => SerializationResult::failed(e.to_string()),
  }
}

/// Decode data produced by [`encode`] back into a typed value.
pub fn decode<T: DeserializeOwned>(serializer: &dyn Serializer, data: &str) -> Result<T, EnvelopeError> {
  let value = serializer.deserialize(data)?;
  serde_json::from_value(value).map_err(EnvelopeError::Malformed)
}

/// Decode an envelope from the wire.
pub fn decode_envelope(serializer: &dyn Serializer, data: &str) -> Result<Envelope, EnvelopeError> {
  decode(serializer, data)
}
