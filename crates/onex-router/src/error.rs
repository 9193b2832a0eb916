//! Router error types.

use onex_core::{BackoffStrategy, CoreError, ErrorInfo};
use onex_schema::{SchemaError, ValidationError};

/// A failure reported by a [`Handler`](crate::Handler).
///
/// Retry guidance is decided by the handler; the router only forwards it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
  pub message: String,
  pub retryable: bool,
  pub backoff_strategy: BackoffStrategy,
  pub max_attempts: u32,
}

impl HandlerError {
  /// A non-retryable handler failure.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      retryable: false,
      backoff_strategy: BackoffStrategy::None,
      max_attempts: 1,
    }
  }

  /// A handler failure the caller may retry.
  pub fn retryable(
    message: impl Into<String>,
    backoff_strategy: BackoffStrategy,
    max_attempts: u32,
  ) -> Self {
    Self {
      retryable: true,
      backoff_strategy,
      max_attempts: max_attempts.max(1),
      ..Self::new(message)
    }
  }

  pub fn to_error_info(&self) -> ErrorInfo {
    let info = ErrorInfo::handler_failure(self.message.clone());
    if self.retryable {
      info.with_retry(self.backoff_strategy, self.max_attempts)
    } else {
      info
    }
  }
}

/// Errors that can occur while routing an event.
///
/// Expected failures (invalid transitions, schema violations of the next
/// state) are not errors: they come back as a failed
/// [`ProcessOutcome`](crate::ProcessOutcome).
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
  /// The handler failed. Propagated unmodified; never retried here.
  #[error("handler for '{event_type}' failed: {source}")]
  Handler {
    event_type: String,
    #[source]
    source: HandlerError,
  },

  /// The handler response could not be turned into an action
  /// (e.g. the event carried no `target_id`).
  #[error("malformed action for '{event_type}': {source}")]
  MalformedAction {
    event_type: String,
    #[source]
    source: CoreError,
  },

  /// A route definition could not be compiled.
  #[error("invalid route for '{event_type}': {message}")]
  InvalidRoute { event_type: String, message: String },

  /// The metadata schema could not be loaded, parsed or compiled.
  #[error("invalid metadata schema: {0}")]
  Schema(#[from] SchemaError),

  /// The definition names an external schema but none was resolved.
  #[error("metadata schema '{0}' must be resolved through a schema loader")]
  UnresolvedSchema(String),

  /// The initial metadata does not satisfy the metadata schema.
  #[error("initial metadata is invalid: {0}")]
  InvalidInitialState(#[source] ValidationError),

  /// The workflow actor has stopped.
  #[error("workflow actor is not running")]
  ActorStopped,
}

impl RouterError {
  /// Failure detail for errors that describe a failed operation, as opposed
  /// to a misconfigured or stopped router.
  pub fn error_info(&self) -> Option<ErrorInfo> {
    match self {
      RouterError::Handler { source, .. } => Some(source.to_error_info()),
      RouterError::MalformedAction { source, .. } => {
        Some(ErrorInfo::validation_failure(source.to_string()))
      }
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use onex_core::ErrorKind;

  #[test]
  fn test_handler_error_guidance() {
    let info = HandlerError::retryable("upstream timeout", BackoffStrategy::Exponential, 3)
      .to_error_info();

    assert_eq!(info.kind, ErrorKind::HandlerFailure);
    assert!(info.retryable);
    assert_eq!(info.backoff_strategy, BackoffStrategy::Exponential);
    assert_eq!(info.max_attempts, 3);

    let fatal = HandlerError::new("bad payload").to_error_info();
    assert!(!fatal.retryable);
    assert_eq!(fatal.max_attempts, 1);
  }

  #[test]
  fn test_router_error_info() {
    let err = RouterError::Handler {
      event_type: "user.created".to_string(),
      source: HandlerError::new("boom"),
    };
    assert_eq!(err.error_info().unwrap().kind, ErrorKind::HandlerFailure);
    assert!(RouterError::ActorStopped.error_info().is_none());
  }
}
