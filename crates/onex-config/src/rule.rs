use serde::{Deserialize, Serialize};

/// A condition an action must satisfy against the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "guard", rename_all = "snake_case")]
pub enum GuardDef {
  /// Always satisfied.
  Always,
  /// The action's target must already exist as a metadata key.
  TargetPresent,
  /// The action's target must not exist yet.
  TargetAbsent,
  /// Every listed key must be present in the action parameters.
  RequireParameters { keys: Vec<String> },
  /// A top-level metadata key must hold exactly this value.
  MetadataEquals {
    key: String,
    value: serde_json::Value,
  },
  /// The target's object must have `field` equal to `value`.
  TargetFieldEquals {
    field: String,
    value: serde_json::Value,
  },
}

/// How an accepted action changes metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDef {
  /// Merge parameters into the object stored under the target key.
  #[default]
  UpsertTarget,
  /// Replace the target's value with the parameters.
  ReplaceTarget,
  /// Remove the target key.
  RemoveTarget,
  /// Merge parameters into the top-level metadata.
  MergeRoot,
}

/// Transition rule for one action type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleDef {
  /// All guards must hold for the transition to be valid.
  #[serde(default)]
  pub guards: Vec<GuardDef>,
  #[serde(default)]
  pub effect: EffectDef,
}
