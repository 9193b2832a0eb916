//! Metadata schemas: standard JSON Schema plus a non-standard top-level
//! `version` giving the minimum compatible schema version:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "required": ["tenant"],
//!   "properties": { "tenant": { "type": "string", "enum": ["acme", "globex"] } },
//!   "additionalProperties": true
//! }
//! ```
//!
//! Everything except `version` is handed to the JSON Schema validator.

use std::collections::HashMap;
use std::fmt;

use onex_core::SchemaVersion;

use crate::error::SchemaError;

/// JSON Schema primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
  String,
  Number,
  Integer,
  Boolean,
  Null,
  Array,
  Object,
}

impl SchemaType {
  fn parse(type_str: &str) -> Option<Self> {
    match type_str {
      "string" => Some(SchemaType::String),
      "number" => Some(SchemaType::Number),
      "integer" => Some(SchemaType::Integer),
      "boolean" => Some(SchemaType::Boolean),
      "null" => Some(SchemaType::Null),
      "array" => Some(SchemaType::Array),
      "object" => Some(SchemaType::Object),
      _ => None,
    }
  }
}

impl fmt::Display for SchemaType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SchemaType::String => "string",
      SchemaType::Number => "number",
      SchemaType::Integer => "integer",
      SchemaType::Boolean => "boolean",
      SchemaType::Null => "null",
      SchemaType::Array => "array",
      SchemaType::Object => "object",
    };
    f.write_str(name)
  }
}

/// Extract property types from a JSON Schema object.
///
/// Unknown type names default to string; properties without a `type` are
/// skipped.
pub fn extract_schema_types(json_schema: &serde_json::Value) -> HashMap<String, SchemaType> {
  let mut types = HashMap::new();

  if let Some(properties) = json_schema.get("properties").and_then(|p| p.as_object()) {
    for (name, prop_schema) in properties {
      if let Some(type_str) = prop_schema.get("type").and_then(|t| t.as_str()) {
        let schema_type = SchemaType::parse(type_str).unwrap_or(SchemaType::String);
        types.insert(name.clone(), schema_type);
      }
    }
  }

  types
}

/// Parsed metadata schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSchema {
  /// Minimum schema version metadata must be compatible with.
  pub version: SchemaVersion,
  /// The JSON Schema document without the `version` key.
  pub document: serde_json::Value,
}

impl MetadataSchema {
  pub fn from_json(json_schema: &serde_json::Value) -> Result<Self, SchemaError> {
    let Some(object) = json_schema.as_object() else {
      return Err(SchemaError::Invalid {
        message: "schema must be a JSON object".to_string(),
      });
    };

    let version = match object.get("version") {
      None => SchemaVersion::default(),
      Some(serde_json::Value::String(s)) => s.parse().map_err(|e| SchemaError::Invalid {
        message: format!("{}", e),
      })?,
      Some(other) => {
        return Err(SchemaError::Invalid {
          message: format!("version must be a string, got {}", other),
        });
      }
    };

    let mut document = object.clone();
    document.remove("version");

    Ok(Self {
      version,
      document: serde_json::Value::Object(document),
    })
  }
}
