use std::fmt;

use jsonschema::JSONSchema;
use onex_core::StateMetadata;

use crate::error::{SchemaError, ValidationError};
use crate::schema::MetadataSchema;

/// Checks metadata shape before it becomes part of a workflow state.
pub trait SchemaValidator: Send + Sync {
  fn validate(&self, metadata: &StateMetadata) -> Result<(), ValidationError>;
}

/// Accepts any metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SchemaValidator for AcceptAll {
  fn validate(&self, _metadata: &StateMetadata) -> Result<(), ValidationError> {
    Ok(())
  }
}

/// Validates metadata against a [`MetadataSchema`].
///
/// The schema version is checked first; the metadata values are then
/// validated as one JSON object against the compiled schema document. The
/// first violation is reported.
pub struct JsonSchemaValidator {
  schema: MetadataSchema,
  compiled: JSONSchema,
}

impl JsonSchemaValidator {
  pub fn new(schema: MetadataSchema) -> Result<Self, SchemaError> {
    let compiled = JSONSchema::compile(&schema.document).map_err(|error| SchemaError::Invalid {
      message: format!("failed to compile metadata schema: {}", error),
    })?;

    Ok(Self { schema, compiled })
  }

  pub fn from_json(json_schema: &serde_json::Value) -> Result<Self, SchemaError> {
    Self::new(MetadataSchema::from_json(json_schema)?)
  }

  pub fn schema(&self) -> &MetadataSchema {
    &self.schema
  }
}

impl fmt::Debug for JsonSchemaValidator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JsonSchemaValidator")
      .field("schema", &self.schema)
      .finish_non_exhaustive()
  }
}

impl SchemaValidator for JsonSchemaValidator {
  fn validate(&self, metadata: &StateMetadata) -> Result<(), ValidationError> {
    if !metadata
      .schema_version
      .is_compatible_with(&self.schema.version)
    {
      return Err(ValidationError::IncompatibleVersion {
        actual: metadata.schema_version.clone(),
        required: self.schema.version.clone(),
      });
    }

    let instance = serde_json::Value::Object(metadata.values.clone());
    self.compiled.validate(&instance).map_err(|errors| {
      match errors.into_iter().next() {
        Some(error) => ValidationError::Violation {
          path: error.instance_path.to_string(),
          message: error.to_string(),
        },
        None => ValidationError::Violation {
          path: String::new(),
          message: "schema validation failed".to_string(),
        },
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use onex_core::SchemaVersion;
  use serde_json::json;

  fn metadata(values: serde_json::Value, version: SchemaVersion) -> StateMetadata {
    StateMetadata::new(values.as_object().cloned().unwrap_or_default(), version)
  }

  fn validator() -> JsonSchemaValidator {
    JsonSchemaValidator::from_json(&json!({
      "version": "1.0.0",
      "required": ["tenant"],
      "properties": {
        "tenant": { "type": "string" },
        "seats": { "type": "integer" }
      },
      "additionalProperties": false
    }))
    .unwrap()
  }

  fn violation_path(result: Result<(), ValidationError>) -> String {
    match result {
      Err(ValidationError::Violation { path, .. }) => path,
      other => panic!("expected a violation, got {:?}", other),
    }
  }

  #[test]
  fn test_valid_metadata() {
    let md = metadata(json!({ "tenant": "acme", "seats": 3 }), SchemaVersion::new(1, 2, 0));
    assert!(validator().validate(&md).is_ok());
  }

  #[test]
  fn test_missing_required_key() {
    let md = metadata(json!({ "seats": 3 }), SchemaVersion::default());
    let err = validator().validate(&md).unwrap_err();
    assert!(matches!(err, ValidationError::Violation { .. }));
    assert!(err.to_string().contains("tenant"));
  }

  #[test]
  fn test_type_mismatch() {
    let md = metadata(json!({ "tenant": "acme", "seats": "3" }), SchemaVersion::default());
    assert_eq!(violation_path(validator().validate(&md)), "/seats");
  }

  #[test]
  fn test_unexpected_key() {
    let md = metadata(json!({ "tenant": "acme", "extra": true }), SchemaVersion::default());
    assert!(matches!(
      validator().validate(&md),
      Err(ValidationError::Violation { .. })
    ));
  }

  #[test]
  fn test_enum_and_nested_required() {
    let validator = JsonSchemaValidator::from_json(&json!({
      "properties": {
        "phase": { "type": "string", "enum": ["open", "closed"] },
        "u1": { "type": "object", "required": ["status"] }
      }
    }))
    .unwrap();

    let bad_phase = metadata(
      json!({ "phase": "bogus", "u1": { "status": "active" } }),
      SchemaVersion::default(),
    );
    assert_eq!(violation_path(validator.validate(&bad_phase)), "/phase");

    let bad_user = metadata(json!({ "phase": "open", "u1": {} }), SchemaVersion::default());
    assert_eq!(violation_path(validator.validate(&bad_user)), "/u1");

    let both = metadata(json!({ "phase": "bogus", "u1": {} }), SchemaVersion::default());
    assert!(validator.validate(&both).is_err());

    let good = metadata(
      json!({ "phase": "closed", "u1": { "status": "active" } }),
      SchemaVersion::default(),
    );
    assert!(validator.validate(&good).is_ok());
  }

  #[test]
  fn test_malformed_schema_rejected() {
    assert!(matches!(
      JsonSchemaValidator::from_json(&json!({ "required": "tenant" })),
      Err(SchemaError::Invalid { .. })
    ));
    assert!(
      JsonSchemaValidator::from_json(&json!({ "properties": { "n": { "type": "decimal" } } }))
        .is_err()
    );
  }

  #[test]
  fn test_incompatible_version() {
    let md = metadata(json!({ "tenant": "acme" }), SchemaVersion::new(2, 0, 0));
    assert!(matches!(
      validator().validate(&md),
      Err(ValidationError::IncompatibleVersion { .. })
    ));
  }

  #[test]
  fn test_accept_all() {
    let md = metadata(json!({ "anything": [1, 2] }), SchemaVersion::new(9, 9, 9));
    assert!(AcceptAll.validate(&md).is_ok());
  }
}
