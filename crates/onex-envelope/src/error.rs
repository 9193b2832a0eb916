/// Errors wrapping or unwrapping envelopes.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
  #[error("failed to encode payload: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("failed to decode '{envelope_type}' payload: {source}")]
  Decode {
    envelope_type: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("malformed data: {0}")]
  Malformed(#[source] serde_json::Error),
}
