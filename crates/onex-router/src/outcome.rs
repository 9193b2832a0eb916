use std::sync::Arc;

use onex_core::{Action, ErrorInfo, NodeResult, WorkflowState};
use serde_json::json;

use crate::handler::HandlerResponse;

/// What happened to a routed event that produced an action.
///
/// On success `state` is the newly committed state and the result carries the
/// handler response. On failure `state` is the unchanged current state and the
/// result carries the error.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
  action: Action,
  state: Arc<WorkflowState>,
  result: NodeResult<HandlerResponse>,
}

impl ProcessOutcome {
  pub(crate) fn new(
    action: Action,
    state: Arc<WorkflowState>,
    result: NodeResult<HandlerResponse>,
  ) -> Self {
    Self {
      action,
      state,
      result,
    }
  }

  /// Whether a new state was committed.
  pub fn processed(&self) -> bool {
    self.result.is_success()
  }

  pub fn action(&self) -> &Action {
    &self.action
  }

  pub fn state(&self) -> &Arc<WorkflowState> {
    &self.state
  }

  pub fn result(&self) -> &NodeResult<HandlerResponse> {
    &self.result
  }

  pub fn event_result(&self) -> Option<&HandlerResponse> {
    self.result.value()
  }

  pub fn error(&self) -> Option<&ErrorInfo> {
    self.result.error()
  }

  /// Caller-facing JSON shape.
  ///
  /// ```json
  /// { "processed": true, "new_state": {..}, "event_result": {..} }
  /// { "processed": false, "error": "invalid transition", "current_state": {..} }
  /// ```
  pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
    let state = serde_json::to_value(self.state.as_ref())?;

    let value = match self.result.error() {
      None => json!({
        "processed": true,
        "new_state": state,
        "event_result": self.event_result(),
      }),
      Some(error) => json!({
        "processed": false,
        "error": error.message,
        "error_kind": serde_json::to_value(error.kind)?,
        "current_state": state,
      }),
    };
    Ok(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use onex_core::{SchemaVersion, StateMetadata};

  fn action() -> Action {
    Action::new("user.created", "u1", "user.created", HandlerResponse::new()).unwrap()
  }

  fn state() -> Arc<WorkflowState> {
    Arc::new(WorkflowState::initial(StateMetadata::new(
      Default::default(),
      SchemaVersion::default(),
    )))
  }

  #[test]
  fn test_success_json() {
    let mut response = HandlerResponse::new();
    response.insert("status".to_string(), json!("welcome_email_sent"));

    let outcome = ProcessOutcome::new(action(), state(), NodeResult::success(response));
    let value = outcome.to_json().unwrap();

    assert!(outcome.processed());
    assert_eq!(value["processed"], json!(true));
    assert_eq!(value["event_result"]["status"], json!("welcome_email_sent"));
    assert_eq!(value["new_state"]["version"], json!(0));
    assert!(value.get("current_state").is_none());
  }

  #[test]
  fn test_failure_json() {
    let outcome = ProcessOutcome::new(
      action(),
      state(),
      NodeResult::failure(ErrorInfo::invalid_transition("invalid transition")),
    );
    let value = outcome.to_json().unwrap();

    assert!(!outcome.processed());
    assert!(outcome.event_result().is_none());
    assert_eq!(value["processed"], json!(false));
    assert_eq!(value["error"], json!("invalid transition"));
    assert_eq!(value["error_kind"], json!("invalid_transition"));
    assert!(value.get("new_state").is_none());
  }

  #[test]
  fn test_json_carries_serialized_state() {
    let values = json!({ "u1": { "status": "active" } })
      .as_object()
      .cloned()
      .unwrap_or_default();
    let committed = Arc::new(state().successor(values));
    let outcome = ProcessOutcome::new(action(), committed, NodeResult::empty());

    let value = outcome.to_json().unwrap();
    assert!(value["new_state"].is_object());
    assert_eq!(value["new_state"]["version"], json!(1));
    assert_eq!(
      value["new_state"]["metadata"]["values"]["u1"]["status"],
      json!("active")
    );
    assert!(value["event_result"].is_null());
  }
}
