//! Reduction properties over arbitrary action sequences.
//!
//! Actions are drawn from a small space of types, targets and statuses so that
//! sequences mix accepted and rejected transitions.

use onex_config::{EffectDef, GuardDef, RuleDef};
use onex_core::{Action, SchemaVersion, StateMetadata, WorkflowState};
use onex_reducer::{ReduceError, Reducer, RuleReducer};
use proptest::prelude::*;
use serde_json::json;

fn users_reducer() -> RuleReducer {
  RuleReducer::new(StateMetadata::new(Default::default(), SchemaVersion::default()))
    .with_rule(
      "user.created",
      RuleDef {
        guards: vec![GuardDef::TargetAbsent],
        effect: EffectDef::UpsertTarget,
      },
    )
    .with_rule(
      "user.updated",
      RuleDef {
        guards: vec![GuardDef::TargetPresent],
        effect: EffectDef::UpsertTarget,
      },
    )
    .with_rule(
      "user.deleted",
      RuleDef {
        guards: vec![
          GuardDef::TargetPresent,
          GuardDef::TargetFieldEquals {
            field: "status".to_string(),
            value: json!("inactive"),
          },
        ],
        effect: EffectDef::RemoveTarget,
      },
    )
}

/// Generate an action against one of four users.
fn arb_action() -> impl Strategy<Value = Action> {
  (
    prop_oneof![
      Just("user.created"),
      Just("user.updated"),
      Just("user.deleted"),
      Just("user.renamed"),
    ],
    0u8..4,
    prop_oneof![Just("active"), Just("inactive")],
  )
    .prop_map(|(action_type, user, status)| {
      let params = json!({ "status": status })
        .as_object()
        .cloned()
        .unwrap_or_default();
      Action::new(action_type, format!("u{}", user), action_type, params).unwrap()
    })
}

proptest! {
  /// The final version equals the number of accepted reductions.
  #[test]
  fn prop_version_counts_accepted_actions(actions in prop::collection::vec(arb_action(), 0..60)) {
    let reducer = users_reducer();
    let mut state = reducer.initial_state();
    let mut accepted = 0u64;

    for action in &actions {
      match reducer.reduce(&state, action) {
        Ok(next) => {
          prop_assert_eq!(next.version(), state.version() + 1);
          accepted += 1;
          state = next;
        }
        Err(ReduceError::InvalidTransition { version, .. }) => {
          prop_assert_eq!(version, state.version());
          prop_assert!(!reducer.is_valid_transition(&state, action));
        }
      }
    }

    prop_assert_eq!(state.version(), accepted);
  }

  /// Reducing never changes the state or action it was given.
  #[test]
  fn prop_reduce_leaves_inputs_untouched(actions in prop::collection::vec(arb_action(), 1..40)) {
    let reducer = users_reducer();
    let mut state = reducer.initial_state();

    for action in &actions {
      let state_before = state.clone();
      let action_before = action.clone();

      let result = reducer.reduce(&state, action);

      prop_assert_eq!(&state, &state_before);
      prop_assert_eq!(action, &action_before);

      if let Ok(next) = result {
        state = next;
      }
    }
  }

  /// Replaying the same actions reaches the same metadata and version.
  #[test]
  fn prop_replay_is_deterministic(actions in prop::collection::vec(arb_action(), 0..40)) {
    let reducer = users_reducer();

    let replay = |actions: &[Action]| -> WorkflowState {
      actions.iter().fold(reducer.initial_state(), |state, action| {
        reducer.reduce(&state, action).unwrap_or(state)
      })
    };

    let first = replay(&actions);
    let second = replay(&actions);

    prop_assert_eq!(first.version(), second.version());
    prop_assert_eq!(first.values(), second.values());
  }
}
