//! Data-driven reducer configured from transition rules.

use std::collections::BTreeMap;

use onex_config::{EffectDef, GuardDef, RuleDef, WorkflowDef};
use onex_core::{Action, MetadataValues, StateMetadata, WorkflowState};
use tracing::debug;

use crate::reducer::Reducer;

/// A reducer whose behavior is described by [`RuleDef`]s keyed by action type.
///
/// Metadata is treated as a map of targets: the action's `target_id` names a
/// top-level key, and effects read or write the value stored there.
#[derive(Debug, Clone)]
pub struct RuleReducer {
  name: String,
  initial: StateMetadata,
  rules: BTreeMap<String, RuleDef>,
  default_rule: Option<RuleDef>,
}

impl RuleReducer {
  pub fn new(initial: StateMetadata) -> Self {
    Self {
      name: "rule_reducer".to_string(),
      initial,
      rules: BTreeMap::new(),
      default_rule: None,
    }
  }

  /// Build from a workflow definition.
  pub fn from_def(def: &WorkflowDef) -> Self {
    Self {
      name: format!("{}.reducer", def.workflow_id),
      initial: def.initial_state_metadata(),
      rules: def.rules.clone(),
      default_rule: def.default_rule.clone(),
    }
  }

  pub fn with_rule(mut self, action_type: impl Into<String>, rule: RuleDef) -> Self {
    self.rules.insert(action_type.into(), rule);
    self
  }

  pub fn with_default_rule(mut self, rule: RuleDef) -> Self {
    self.default_rule = Some(rule);
    self
  }

  fn rule_for(&self, action_type: &str) -> Option<&RuleDef> {
    self.rules.get(action_type).or(self.default_rule.as_ref())
  }
}

fn guard_holds(guard: &GuardDef, state: &WorkflowState, action: &Action) -> bool {
  let values = state.values();
  match guard {
    GuardDef::Always => true,
    GuardDef::TargetPresent => values.contains_key(action.target_id()),
    GuardDef::TargetAbsent => !values.contains_key(action.target_id()),
    GuardDef::RequireParameters { keys } => keys.iter().all(|k| action.parameters().contains_key(k)),
    GuardDef::MetadataEquals { key, value } => values.get(key) == Some(value),
    GuardDef::TargetFieldEquals { field, value } => values
      .get(action.target_id())
      .and_then(|target| target.get(field))
      == Some(value),
  }
}

impl Reducer for RuleReducer {
  fn name(&self) -> &str {
    &self.name
  }

  fn initial_state(&self) -> WorkflowState {
    WorkflowState::initial(self.initial.clone())
  }

  fn is_valid_transition(&self, state: &WorkflowState, action: &Action) -> bool {
    let Some(rule) = self.rule_for(action.action_type()) else {
      debug!(action_type = %action.action_type(), "no rule for action type");
      return false;
    };

    match rule.guards.iter().find(|g| !guard_holds(g, state, action)) {
      Some(failed) => {
        debug!(
          action_type = %action.action_type(),
          target_id = %action.target_id(),
          guard = ?failed,
          "guard rejected action"
        );
        false
      }
      None => true,
    }
  }

  fn transition(&self, state: &WorkflowState, action: &Action) -> MetadataValues {
    let mut values = state.values().clone();
    let params = action.parameters();
    let effect = self
      .rule_for(action.action_type())
      .map(|rule| rule.effect)
      .unwrap_or_default();

    match effect {
      EffectDef::UpsertTarget => {
        let merged = match values.get(action.target_id()) {
          Some(serde_json::Value::Object(existing)) => {
            let mut merged = existing.clone();
            merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
          }
          _ => params.clone(),
        };
        values.insert(
          action.target_id().to_string(),
          serde_json::Value::Object(merged),
        );
      }
      EffectDef::ReplaceTarget => {
        values.insert(
          action.target_id().to_string(),
          serde_json::Value::Object(params.clone()),
        );
      }
      EffectDef::RemoveTarget => {
        values.remove(action.target_id());
      }
      EffectDef::MergeRoot => {
        values.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
      }
    }

    values
  }
}
