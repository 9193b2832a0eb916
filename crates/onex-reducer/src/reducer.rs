use std::sync::Arc;

use onex_core::{Action, MetadataValues, WorkflowState};

use crate::error::ReduceError;

/// A pure state transition function.
///
/// Implementors supply the validity predicate and the metadata transition;
/// [`reduce`](Reducer::reduce) ties them together and owns the versioning
/// rules, so every reducer:
/// - rejects invalid pairs with [`ReduceError::InvalidTransition`] instead of
///   producing a state
/// - returns a new state with `version + 1` and a fresh `last_updated`
/// - never mutates its inputs (both are borrowed immutably)
///
/// `is_valid_transition` and `transition` must be deterministic and free of
/// I/O so that replaying the same actions yields the same states.
pub trait Reducer: Send + Sync {
  /// Stage identifier recorded in result provenance.
  fn name(&self) -> &str {
    "reducer"
  }

  /// The state a new workflow instance starts from (version 0).
  fn initial_state(&self) -> WorkflowState;

  /// Whether `action` may be applied to `state`.
  fn is_valid_transition(&self, state: &WorkflowState, action: &Action) -> bool;

  /// Metadata values after applying `action`. Only called for valid pairs.
  fn transition(&self, state: &WorkflowState, action: &Action) -> MetadataValues;

  /// Apply `action` to `state`, producing the next state.
  fn reduce(&self, state: &WorkflowState, action: &Action) -> Result<WorkflowState, ReduceError> {
    if !self.is_valid_transition(state, action) {
      return Err(ReduceError::InvalidTransition {
        action_type: action.action_type().to_string(),
        target_id: action.target_id().to_string(),
        version: state.version(),
      });
    }

    let values = self.transition(state, action);
    Ok(state.successor(values))
  }
}

impl<R: Reducer + ?Sized> Reducer for Arc<R> {
  fn name(&self) -> &str {
    (**self).name()
  }

  fn initial_state(&self) -> WorkflowState {
    (**self).initial_state()
  }

  fn is_valid_transition(&self, state: &WorkflowState, action: &Action) -> bool {
    (**self).is_valid_transition(state, action)
  }

  fn transition(&self, state: &WorkflowState, action: &Action) -> MetadataValues {
    (**self).transition(state, action)
  }

  fn reduce(&self, state: &WorkflowState, action: &Action) -> Result<WorkflowState, ReduceError> {
    (**self).reduce(state, action)
  }
}
