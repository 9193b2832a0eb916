use chrono::{DateTime, Utc};
use onex_core::{Context, ContextValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// Transport wrapper pairing a payload with routing and correlation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
  pub envelope_id: String,
  pub envelope_type: String,
  pub correlation_id: String,
  pub payload: serde_json::Value,
  #[serde(default)]
  pub metadata: Context,
  pub created_at: DateTime<Utc>,
}

impl Envelope {
  /// Attach a metadata entry.
  pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
    self.metadata.insert(key.into(), value.into());
    self
  }
}

/// Wrap a payload in an envelope.
///
/// The type and correlation id are opaque labels; any string is accepted,
/// including an empty one.
pub fn create_envelope<T: Serialize>(
  payload: &T,
  envelope_type: impl Into<String>,
  correlation_id: impl Into<String>,
) -> Result<Envelope, EnvelopeError> {
  Ok(Envelope {
    envelope_id: uuid::Uuid::new_v4().to_string(),
    envelope_type: envelope_type.into(),
    correlation_id: correlation_id.into(),
    payload: serde_json::to_value(payload).map_err(EnvelopeError::Encode)?,
    metadata: Context::new(),
    created_at: Utc::now(),
  })
}

/// Recover the payload of an envelope.
pub fn extract_payload<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, EnvelopeError> {
  serde_json::from_value(envelope.payload.clone()).map_err(|source| EnvelopeError::Decode {
    envelope_type: envelope.envelope_type.clone(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, PartialEq, Serialize, Deserialize)]
  struct Ping {
    seq: u32,
    note: Option<String>,
  }

  #[test]
  fn test_round_trip_json_payload() {
    let payload = json!({ "user": "u1", "tags": ["a", "b"], "n": 1.5 });
    let envelope = create_envelope(&payload, "user.created", "corr-1").unwrap();

    assert_eq!(envelope.envelope_type, "user.created");
    assert_eq!(envelope.correlation_id, "corr-1");

    let extracted: serde_json::Value = extract_payload(&envelope).unwrap();
    assert_eq!(extracted, payload);
  }

  #[test]
  fn test_round_trip_typed_payload() {
    let payload = Ping {
      seq: 7,
      note: None,
    };
    let envelope = create_envelope(&payload, "ping", "").unwrap();

    let extracted: Ping = extract_payload(&envelope).unwrap();
    assert_eq!(extracted, payload);
  }

  #[test]
  fn test_round_trip_through_wire() {
    let envelope = create_envelope(&json!([1, 2, 3]), "batch", "corr-9")
      .unwrap()
      .with_metadata("source", "test");

    let wire = serde_json::to_string(&envelope).unwrap();
    let decoded: Envelope = serde_json::from_str(&wire).unwrap();

    assert_eq!(decoded, envelope);
    assert_eq!(extract_payload::<Vec<u8>>(&decoded).unwrap(), vec![1, 2, 3]);
  }

  #[test]
  fn test_wrong_payload_type() {
    let envelope = create_envelope(&json!("text"), "note", "c").unwrap();
    let err = extract_payload::<Ping>(&envelope).unwrap_err();
    assert!(matches!(err, EnvelopeError::Decode { .. }));
  }

  #[test]
  fn test_empty_type_round_trip() {
    let payload = json!({ "k": 1 });
    let envelope = create_envelope(&payload, "", "c").unwrap();
    assert_eq!(envelope.envelope_type, "");

    let extracted: serde_json::Value = extract_payload(&envelope).unwrap();
    assert_eq!(extracted, payload);
  }
}
