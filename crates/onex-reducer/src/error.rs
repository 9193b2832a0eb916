//! Reducer error types.

use onex_core::ErrorInfo;

/// Errors returned by [`Reducer::reduce`](crate::Reducer::reduce).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReduceError {
  /// The action is not applicable to the state. Retrying the same action
  /// against the same state fails the same way.
  #[error("invalid transition: action '{action_type}' on target '{target_id}' at version {version}")]
  InvalidTransition {
    action_type: String,
    target_id: String,
    version: u64,
  },
}

impl ReduceError {
  /// Failure detail suitable for a failed `NodeResult`.
  pub fn to_error_info(&self) -> ErrorInfo {
    match self {
      ReduceError::InvalidTransition {
        action_type,
        target_id,
        version,
      } => ErrorInfo::invalid_transition("invalid transition")
        .with_context("action_type", action_type.as_str())
        .with_context("target_id", target_id.as_str())
        .with_context("version", *version),
    }
  }
}

impl From<ReduceError> for ErrorInfo {
  fn from(err: ReduceError) -> Self {
    err.to_error_info()
  }
}
