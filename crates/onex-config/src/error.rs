use std::path::PathBuf;

/// Errors loading or validating a workflow definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid workflow definition: {message}")]
  Invalid { message: String },
}
