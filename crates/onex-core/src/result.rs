//! Monadic outcome of a node operation.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, ErrorInfo};

/// Net effect of an operation on workflow metadata. Removed keys map to `null`.
pub type StateDelta = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome<T> {
  Success {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
  },
  Failure {
    error: ErrorInfo,
  },
}

/// Immutable outcome of a node operation.
///
/// A result is either a success (with an optional value) or a failure (with an
/// [`ErrorInfo`]). Independently of that it carries a trust score, the ordered
/// list of stages that produced it, and the state delta it implies.
///
/// Failures propagate through [`and_then`](Self::and_then) without running the
/// continuation, so a chain of steps reads as straight-line code:
///
/// ```
/// use onex_core::NodeResult;
///
/// let result = NodeResult::success(2)
///   .with_stage("parse")
///   .and_then(|v| NodeResult::success(v.unwrap_or(0) * 10).with_stage("scale"));
///
/// assert_eq!(result.value(), Some(&20));
/// assert_eq!(result.provenance(), &["parse".to_string(), "scale".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult<T = serde_json::Value> {
  #[serde(flatten)]
  outcome: Outcome<T>,
  #[serde(
    default = "default_trust_score",
    deserialize_with = "deserialize_trust_score"
  )]
  trust_score: f64,
  #[serde(default)]
  provenance: Vec<String>,
  #[serde(default)]
  state_delta: StateDelta,
}

fn default_trust_score() -> f64 {
  1.0
}

fn validate_trust_score(score: f64) -> Result<f64, CoreError> {
  if (0.0..=1.0).contains(&score) {
    Ok(score)
  } else {
    Err(CoreError::InvalidTrustScore(score))
  }
}

fn deserialize_trust_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
  let score = f64::deserialize(deserializer)?;
  validate_trust_score(score).map_err(serde::de::Error::custom)
}

impl<T> NodeResult<T> {
  fn from_outcome(outcome: Outcome<T>) -> Self {
    Self {
      outcome,
      trust_score: 1.0,
      provenance: Vec::new(),
      state_delta: StateDelta::new(),
    }
  }

  /// A successful result carrying `value`.
  pub fn success(value: T) -> Self {
    Self::from_outcome(Outcome::Success { value: Some(value) })
  }

  /// A successful result without a value.
  pub fn empty() -> Self {
    Self::from_outcome(Outcome::Success { value: None })
  }

  /// A failed result.
  pub fn failure(error: ErrorInfo) -> Self {
    Self::from_outcome(Outcome::Failure { error })
  }

  pub fn is_success(&self) -> bool {
    matches!(self.outcome, Outcome::Success { .. })
  }

  pub fn is_failure(&self) -> bool {
    !self.is_success()
  }

  pub fn value(&self) -> Option<&T> {
    match &self.outcome {
      Outcome::Success { value } => value.as_ref(),
      Outcome::Failure { .. } => None,
    }
  }

  pub fn error(&self) -> Option<&ErrorInfo> {
    match &self.outcome {
      Outcome::Success { .. } => None,
      Outcome::Failure { error } => Some(error),
    }
  }

  pub fn trust_score(&self) -> f64 {
    self.trust_score
  }

  pub fn provenance(&self) -> &[String] {
    &self.provenance
  }

  pub fn state_delta(&self) -> &StateDelta {
    &self.state_delta
  }

  /// Replace the trust score. Fails outside [0.0, 1.0].
  pub fn with_trust_score(mut self, score: f64) -> Result<Self, CoreError> {
    self.trust_score = validate_trust_score(score)?;
    Ok(self)
  }

  /// Append a stage identifier to the provenance chain.
  pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
    self.provenance.push(stage.into());
    self
  }

  pub fn with_state_delta(mut self, delta: StateDelta) -> Self {
    self.state_delta = delta;
    self
  }

  /// Consume the result, yielding the value or the error.
  pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
    match self.outcome {
      Outcome::Success { value } => Ok(value),
      Outcome::Failure { error } => Err(error),
    }
  }

  /// Transform the value of a success. Failures and value-less successes pass through.
  pub fn map<U, F>(self, f: F) -> NodeResult<U>
  where
    F: FnOnce(T) -> U,
  {
    let outcome = match self.outcome {
      Outcome::Success { value } => Outcome::Success {
        value: value.map(f),
      },
      Outcome::Failure { error } => Outcome::Failure { error },
    };

    NodeResult {
      outcome,
      trust_score: self.trust_score,
      provenance: self.provenance,
      state_delta: self.state_delta,
    }
  }

  /// Chain a dependent step onto a success.
  ///
  /// The continuation receives the (optional) value. The combined result has
  /// both provenance chains in order, the lower of the two trust scores, and
  /// the merged state delta with the later step winning on conflicts. A
  /// failure short-circuits without calling `f`.
  pub fn and_then<U, F>(self, f: F) -> NodeResult<U>
  where
    F: FnOnce(Option<T>) -> NodeResult<U>,
  {
    match self.outcome {
      Outcome::Success { value } => {
        let next = f(value);
        combine(self.provenance, self.trust_score, self.state_delta, next)
      }
      Outcome::Failure { error } => NodeResult {
        outcome: Outcome::Failure { error },
        trust_score: self.trust_score,
        provenance: self.provenance,
        state_delta: self.state_delta,
      },
    }
  }

  /// Transform the error of a failure.
  pub fn map_err<F>(self, f: F) -> Self
  where
    F: FnOnce(ErrorInfo) -> ErrorInfo,
  {
    let outcome = match self.outcome {
      Outcome::Failure { error } => Outcome::Failure { error: f(error) },
      success => success,
    };

    Self { outcome, ..self }
  }

  /// Recover from a failure with another step. Successes pass through untouched.
  pub fn or_else<F>(self, f: F) -> Self
  where
    F: FnOnce(ErrorInfo) -> NodeResult<T>,
  {
    match self.outcome {
      Outcome::Failure { error } => {
        let next = f(error);
        combine(self.provenance, self.trust_score, self.state_delta, next)
      }
      success => Self {
        outcome: success,
        ..self
      },
    }
  }
}

fn combine<U>(
  mut provenance: Vec<String>,
  trust_score: f64,
  mut state_delta: StateDelta,
  next: NodeResult<U>,
) -> NodeResult<U> {
  provenance.extend(next.provenance);
  state_delta.extend(next.state_delta);

  NodeResult {
    outcome: next.outcome,
    trust_score: trust_score.min(next.trust_score),
    provenance,
    state_delta,
  }
}
