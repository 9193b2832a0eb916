//! Actions: immutable commands describing an intended state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Operation arguments carried by an action.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// An immutable command consumed exactly once by a reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction")]
pub struct Action {
  action_id: String,
  #[serde(rename = "type")]
  action_type: String,
  target_id: String,
  operation: String,
  parameters: Parameters,
  timestamp: DateTime<Utc>,
}

/// Unvalidated wire form of an [`Action`].
#[derive(Deserialize)]
struct RawAction {
  #[serde(default)]
  action_id: Option<String>,
  #[serde(rename = "type")]
  action_type: String,
  target_id: String,
  operation: String,
  #[serde(default)]
  parameters: Parameters,
  timestamp: DateTime<Utc>,
}

impl TryFrom<RawAction> for Action {
  type Error = CoreError;

  fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
    let mut action = Action::new(raw.action_type, raw.target_id, raw.operation, raw.parameters)?
      .with_timestamp(raw.timestamp);
    if let Some(id) = raw.action_id.filter(|id| !id.is_empty()) {
      action.action_id = id;
    }
    Ok(action)
  }
}

impl Action {
  /// Create an action stamped with the current time.
  ///
  /// `action_type`, `target_id` and `operation` must be non-empty.
  pub fn new(
    action_type: impl Into<String>,
    target_id: impl Into<String>,
    operation: impl Into<String>,
    parameters: Parameters,
  ) -> Result<Self, CoreError> {
    let action_type = required("type", action_type.into())?;
    let target_id = required("target_id", target_id.into())?;
    let operation = required("operation", operation.into())?;

    Ok(Self {
      action_id: uuid::Uuid::new_v4().to_string(),
      action_type,
      target_id,
      operation,
      parameters,
      timestamp: Utc::now(),
    })
  }

  /// Override the creation timestamp (replaying recorded actions).
  pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
    self.timestamp = timestamp;
    self
  }

  pub fn action_id(&self) -> &str {
    &self.action_id
  }

  pub fn action_type(&self) -> &str {
    &self.action_type
  }

  pub fn target_id(&self) -> &str {
    &self.target_id
  }

  pub fn operation(&self) -> &str {
    &self.operation
  }

  pub fn parameters(&self) -> &Parameters {
    &self.parameters
  }

  /// Look up a single parameter.
  pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
    self.parameters.get(key)
  }

  pub fn timestamp(&self) -> DateTime<Utc> {
    self.timestamp
  }
}

fn required(field: &'static str, value: String) -> Result<String, CoreError> {
  if value.trim().is_empty() {
    Err(CoreError::MissingField { field })
  } else {
    Ok(value)
  }
}
