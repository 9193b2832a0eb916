use onex_core::SchemaVersion;

/// Errors loading or parsing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
  #[error("schema not found: {0}")]
  NotFound(String),

  #[error("invalid schema name: {0}")]
  InvalidName(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse schema: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid schema: {message}")]
  Invalid { message: String },
}

/// Metadata that does not satisfy a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
  /// The metadata value at `path` (a JSON pointer, empty for the root)
  /// breaks a schema keyword.
  #[error("metadata at '{path}' violates schema: {message}")]
  Violation { path: String, message: String },

  #[error("schema version {actual} is not compatible with required {required}")]
  IncompatibleVersion {
    actual: SchemaVersion,
    required: SchemaVersion,
  },
}
