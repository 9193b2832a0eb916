use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A declarative event handler.
///
/// Each `response` value is a minijinja template rendered against the event
/// data, e.g. `{ "greeting": "Welcome {{ name }}" }`. Rendered strings are
/// coerced to typed values using the property types of `response_schema`
/// when one is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
  pub event_type: String,
  /// Fields the event data must carry; otherwise the event is ignored.
  #[serde(default)]
  pub required_fields: Vec<String>,
  pub response: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response_schema: Option<serde_json::Value>,
}
