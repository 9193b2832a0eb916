//! Immutable, versioned workflow state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::result::StateDelta;

/// Metadata key/value pairs.
pub type MetadataValues = serde_json::Map<String, serde_json::Value>;

/// Semantic version of the schema a state's metadata conforms to.
///
/// Serialized as a plain version string such as `"1.2.0"`. Pre-release and
/// build identifiers are accepted and ordered by semver rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(semver::Version);

impl SchemaVersion {
  pub fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self(semver::Version::new(major, minor, patch))
  }

  pub fn major(&self) -> u64 {
    self.0.major
  }

  pub fn as_semver(&self) -> &semver::Version {
    &self.0
  }

  /// Same major version, and `self` is at least as new as `required`.
  pub fn is_compatible_with(&self, required: &SchemaVersion) -> bool {
    self.0.major == required.0.major && self.0 >= required.0
  }
}

impl Default for SchemaVersion {
  fn default() -> Self {
    Self::new(1, 0, 0)
  }
}

impl fmt::Display for SchemaVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

impl FromStr for SchemaVersion {
  type Err = CoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    semver::Version::parse(s.trim())
      .map(Self)
      .map_err(|e| CoreError::InvalidSchemaVersion(format!("'{}': {}", s, e)))
  }
}

impl From<semver::Version> for SchemaVersion {
  fn from(value: semver::Version) -> Self {
    Self(value)
  }
}

/// Metadata of a workflow state, tagged with its schema version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateMetadata {
  #[serde(default)]
  pub values: MetadataValues,
  #[serde(default)]
  pub schema_version: SchemaVersion,
}

impl StateMetadata {
  pub fn new(values: MetadataValues, schema_version: SchemaVersion) -> Self {
    Self {
      values,
      schema_version,
    }
  }

  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.values.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }
}

/// An immutable snapshot of workflow state.
///
/// `version` is a sequence number, not a semantic version: the initial state
/// is version 0 and every successful reduction produces a new state exactly
/// one higher. States are never modified in place; [`successor`](Self::successor)
/// always builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
  metadata: StateMetadata,
  version: u64,
  last_updated: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  provenance: Vec<String>,
}

impl WorkflowState {
  /// The initial state of a workflow (version 0).
  pub fn initial(metadata: StateMetadata) -> Self {
    Self {
      metadata,
      version: 0,
      last_updated: Utc::now(),
      provenance: Vec::new(),
    }
  }

  pub fn metadata(&self) -> &StateMetadata {
    &self.metadata
  }

  pub fn values(&self) -> &MetadataValues {
    &self.metadata.values
  }

  pub fn schema_version(&self) -> &SchemaVersion {
    &self.metadata.schema_version
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn last_updated(&self) -> DateTime<Utc> {
    self.last_updated
  }

  /// Stage identifiers of the result that produced this state.
  pub fn provenance(&self) -> &[String] {
    &self.provenance
  }

  /// Build the next state with new metadata values.
  ///
  /// The schema version is carried over; `version` is incremented and
  /// `last_updated` set to now.
  pub fn successor(&self, values: MetadataValues) -> Self {
    Self {
      metadata: StateMetadata::new(values, self.metadata.schema_version.clone()),
      version: self.version + 1,
      last_updated: Utc::now(),
      provenance: Vec::new(),
    }
  }

  /// Attach the provenance of the result that produced this state.
  pub fn with_provenance(mut self, provenance: Vec<String>) -> Self {
    self.provenance = provenance;
    self
  }

  /// Keys whose values differ between `self` and `next`.
  ///
  /// Added and changed keys carry their new value; removed keys map to `null`.
  pub fn delta_to(&self, next: &WorkflowState) -> StateDelta {
    let old = &self.metadata.values;
    let new = &next.metadata.values;

    let mut delta: StateDelta = new
      .iter()
      .filter(|(key, value)| old.get(*key) != Some(*value))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    for key in old.keys() {
      if !new.contains_key(key) {
        delta.insert(key.clone(), serde_json::Value::Null);
      }
    }

    delta
  }
}
