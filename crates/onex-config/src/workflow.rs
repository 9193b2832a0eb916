use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use onex_core::{MetadataValues, SchemaVersion, StateMetadata};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::route::RouteDef;
use crate::rule::RuleDef;

/// A workflow definition as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub schema_version: SchemaVersion,
  #[serde(default)]
  pub initial_metadata: MetadataValues,
  /// Transition rules keyed by action type.
  #[serde(default)]
  pub rules: BTreeMap<String, RuleDef>,
  /// Rule for action types not listed in `rules`. Without one they are rejected.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_rule: Option<RuleDef>,
  #[serde(default)]
  pub routes: Vec<RouteDef>,
  /// JSON schema that metadata must satisfy after every transition.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata_schema: Option<serde_json::Value>,
  /// Name of a metadata schema kept outside the definition, resolved by a
  /// schema loader. Exclusive with `metadata_schema`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata_schema_ref: Option<String>,
}

impl WorkflowDef {
  /// Parse and validate a definition from a JSON string.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    let def: WorkflowDef = serde_json::from_str(content)?;
    def.validate()?;
    Ok(def)
  }

  /// Read, parse and validate a definition file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }

  /// Check structural constraints serde cannot express.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.workflow_id.trim().is_empty() {
      return Err(invalid("workflow_id must not be empty"));
    }

    if let Some(action_type) = self.rules.keys().find(|k| k.trim().is_empty()) {
      return Err(invalid(format!("rule key '{}' is empty", action_type)));
    }

    let mut seen = HashSet::new();
    for route in &self.routes {
      if route.event_type.trim().is_empty() {
        return Err(invalid("route event_type must not be empty"));
      }
      if !seen.insert(route.event_type.as_str()) {
        return Err(invalid(format!(
          "duplicate route for event type '{}'",
          route.event_type
        )));
      }
    }

    if let Some(schema) = &self.metadata_schema
      && !schema.is_object()
    {
      return Err(invalid("metadata_schema must be a JSON object"));
    }

    match &self.metadata_schema_ref {
      Some(_) if self.metadata_schema.is_some() => {
        return Err(invalid(
          "metadata_schema and metadata_schema_ref are mutually exclusive",
        ));
      }
      Some(name) if name.trim().is_empty() => {
        return Err(invalid("metadata_schema_ref must not be empty"));
      }
      _ => {}
    }

    Ok(())
  }

  /// Metadata of the workflow's initial state.
  pub fn initial_state_metadata(&self) -> StateMetadata {
    StateMetadata::new(self.initial_metadata.clone(), self.schema_version.clone())
  }
}

fn invalid(message: impl Into<String>) -> ConfigError {
  ConfigError::Invalid {
    message: message.into(),
  }
}
