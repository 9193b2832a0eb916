//! Error kinds and retry guidance.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::value::{Context, ContextValue};

/// Contract violations detected while constructing core values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
  /// A required field was empty or absent.
  #[error("missing required field: {field}")]
  MissingField { field: &'static str },

  /// Trust score outside [0.0, 1.0].
  #[error("trust score must be within [0.0, 1.0], got {0}")]
  InvalidTrustScore(f64),

  /// A value had a shape that is not allowed.
  #[error("invalid value: {message}")]
  InvalidValue { message: String },

  /// A schema version string could not be parsed.
  #[error("invalid schema version {0}")]
  InvalidSchemaVersion(String),
}

/// Category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// The action does not apply to the current state.
  InvalidTransition,
  /// An external handler failed.
  HandlerFailure,
  /// Metadata did not match its schema.
  ValidationFailure,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorKind::InvalidTransition => "invalid_transition",
      ErrorKind::HandlerFailure => "handler_failure",
      ErrorKind::ValidationFailure => "validation_failure",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
  #[default]
  None,
  Constant,
  Linear,
  Exponential,
}

/// Failure detail carried by a failed [`NodeResult`](crate::NodeResult).
///
/// Retry guidance (`retryable`, `backoff_strategy`, `max_attempts`) is advisory:
/// nothing in the core retries on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
  pub kind: ErrorKind,
  pub message: String,
  pub retryable: bool,
  pub backoff_strategy: BackoffStrategy,
  pub max_attempts: u32,
  #[serde(default, skip_serializing_if = "Context::is_empty")]
  pub context: Context,
}

impl ErrorInfo {
  fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      retryable: false,
      backoff_strategy: BackoffStrategy::None,
      max_attempts: 1,
      context: Context::new(),
    }
  }

  /// An action that cannot be applied to the current state.
  pub fn invalid_transition(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::InvalidTransition, message)
  }

  /// Metadata that failed schema validation.
  pub fn validation_failure(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::ValidationFailure, message)
  }

  /// A handler failure. Not retryable until [`with_retry`](Self::with_retry) says so.
  pub fn handler_failure(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::HandlerFailure, message)
  }

  /// Mark the error retryable with the given policy.
  pub fn with_retry(mut self, backoff_strategy: BackoffStrategy, max_attempts: u32) -> Self {
    self.retryable = true;
    self.backoff_strategy = backoff_strategy;
    self.max_attempts = max_attempts.max(1);
    self
  }

  /// Attach a context entry.
  pub fn with_context(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
    self.context.insert(key.into(), value.into());
    self
  }

  /// Delay before the next attempt, given how many attempts were already made.
  ///
  /// Returns `None` when the error is not retryable or the attempt budget is
  /// spent. `BackoffStrategy::None` retries immediately.
  pub fn backoff_delay(&self, attempts_made: u32, base: Duration) -> Option<Duration> {
    if !self.retryable || attempts_made >= self.max_attempts {
      return None;
    }

    let delay = match self.backoff_strategy {
      BackoffStrategy::None => Duration::ZERO,
      BackoffStrategy::Constant => base,
      BackoffStrategy::Linear => base.saturating_mul(attempts_made.max(1)),
      BackoffStrategy::Exponential => {
        let exponent = attempts_made.saturating_sub(1).min(31);
        base.saturating_mul(1u32 << exponent)
      }
    };

    Some(delay)
  }
}

impl fmt::Display for ErrorInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.kind, self.message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_invalid_transition_not_retryable() {
    let err = ErrorInfo::invalid_transition("nope");
    assert_eq!(err.kind, ErrorKind::InvalidTransition);
    assert!(!err.retryable);
    assert_eq!(err.max_attempts, 1);
    assert_eq!(err.backoff_delay(0, Duration::from_millis(100)), None);
  }

  #[test]
  fn test_exponential_backoff() {
    let err = ErrorInfo::handler_failure("timeout").with_retry(BackoffStrategy::Exponential, 4);
    let base = Duration::from_millis(100);

    assert_eq!(err.backoff_delay(1, base), Some(Duration::from_millis(100)));
    assert_eq!(err.backoff_delay(2, base), Some(Duration::from_millis(200)));
    assert_eq!(err.backoff_delay(3, base), Some(Duration::from_millis(400)));
    assert_eq!(err.backoff_delay(4, base), None);
  }

  #[test]
  fn test_linear_and_constant_backoff() {
    let base = Duration::from_secs(1);

    let linear = ErrorInfo::handler_failure("busy").with_retry(BackoffStrategy::Linear, 5);
    assert_eq!(linear.backoff_delay(3, base), Some(Duration::from_secs(3)));

    let constant = ErrorInfo::handler_failure("busy").with_retry(BackoffStrategy::Constant, 5);
    assert_eq!(constant.backoff_delay(3, base), Some(Duration::from_secs(1)));
  }

  #[test]
  fn test_serialized_shape() {
    let err = ErrorInfo::validation_failure("missing key").with_context("key", "email");
    let value = serde_json::to_value(&err).unwrap();

    assert_eq!(value["kind"], "validation_failure");
    assert_eq!(value["backoff_strategy"], "none");
    assert_eq!(value["context"]["key"], "email");
  }
}
