//! Context values attached to log records and error details.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A loosely-typed context value.
///
/// Only a closed set of shapes is allowed: scalars, lists of strings, and flat
/// string maps. Anything else (null, nested objects, mixed arrays) is rejected
/// when converting from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
  String(String),
  Integer(i64),
  Float(f64),
  Boolean(bool),
  StringList(Vec<String>),
  Map(BTreeMap<String, String>),
}

impl ContextValue {
  /// Convert to a JSON value.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      ContextValue::String(s) => serde_json::Value::String(s.clone()),
      ContextValue::Integer(i) => serde_json::Value::from(*i),
      ContextValue::Float(f) => serde_json::Number::from_f64(*f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      ContextValue::Boolean(b) => serde_json::Value::Bool(*b),
      ContextValue::StringList(items) => serde_json::Value::from(items.clone()),
      ContextValue::Map(map) => serde_json::Value::Object(
        map
          .iter()
          .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
          .collect(),
      ),
    }
  }
}

impl fmt::Display for ContextValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContextValue::String(s) => f.write_str(s),
      ContextValue::Integer(i) => write!(f, "{}", i),
      ContextValue::Float(v) => write!(f, "{}", v),
      ContextValue::Boolean(b) => write!(f, "{}", b),
      other => write!(f, "{}", other.to_json()),
    }
  }
}

impl TryFrom<serde_json::Value> for ContextValue {
  type Error = CoreError;

  fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
    match value {
      serde_json::Value::String(s) => Ok(ContextValue::String(s)),
      serde_json::Value::Bool(b) => Ok(ContextValue::Boolean(b)),
      serde_json::Value::Number(n) => {
        if let Some(i) = n.as_i64() {
          Ok(ContextValue::Integer(i))
        } else if let Some(f) = n.as_f64() {
          Ok(ContextValue::Float(f))
        } else {
          Err(CoreError::InvalidValue {
            message: format!("number {} does not fit an i64 or f64", n),
          })
        }
      }
      serde_json::Value::Array(items) => items
        .into_iter()
        .map(|item| match item {
          serde_json::Value::String(s) => Ok(s),
          other => Err(CoreError::InvalidValue {
            message: format!("list entries must be strings, got {}", other),
          }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ContextValue::StringList),
      serde_json::Value::Object(map) => map
        .into_iter()
        .map(|(k, v)| match v {
          serde_json::Value::String(s) => Ok((k, s)),
          other => Err(CoreError::InvalidValue {
            message: format!("map entry '{}' must be a string, got {}", k, other),
          }),
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(ContextValue::Map),
      serde_json::Value::Null => Err(CoreError::InvalidValue {
        message: "null is not a valid context value".to_string(),
      }),
    }
  }
}

impl From<&str> for ContextValue {
  fn from(value: &str) -> Self {
    ContextValue::String(value.to_string())
  }
}

impl From<String> for ContextValue {
  fn from(value: String) -> Self {
    ContextValue::String(value)
  }
}

impl From<i64> for ContextValue {
  fn from(value: i64) -> Self {
    ContextValue::Integer(value)
  }
}

impl From<u64> for ContextValue {
  /// Values above `i64::MAX` become floats, as they do when read from JSON.
  fn from(value: u64) -> Self {
    i64::try_from(value)
      .map(ContextValue::Integer)
      .unwrap_or(ContextValue::Float(value as f64))
  }
}

impl From<f64> for ContextValue {
  fn from(value: f64) -> Self {
    ContextValue::Float(value)
  }
}

impl From<bool> for ContextValue {
  fn from(value: bool) -> Self {
    ContextValue::Boolean(value)
  }
}

impl From<Vec<String>> for ContextValue {
  fn from(value: Vec<String>) -> Self {
    ContextValue::StringList(value)
  }
}

impl From<BTreeMap<String, String>> for ContextValue {
  fn from(value: BTreeMap<String, String>) -> Self {
    ContextValue::Map(value)
  }
}

/// Context map attached to log records and errors.
pub type Context = BTreeMap<String, ContextValue>;

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_from_json_scalars() {
    assert_eq!(
      ContextValue::try_from(json!("a")).unwrap(),
      ContextValue::String("a".to_string())
    );
    assert_eq!(
      ContextValue::try_from(json!(7)).unwrap(),
      ContextValue::Integer(7)
    );
    assert_eq!(
      ContextValue::try_from(json!(1.5)).unwrap(),
      ContextValue::Float(1.5)
    );
    assert_eq!(
      ContextValue::try_from(json!(true)).unwrap(),
      ContextValue::Boolean(true)
    );
  }

  #[test]
  fn test_from_json_collections() {
    assert_eq!(
      ContextValue::try_from(json!(["a", "b"])).unwrap(),
      ContextValue::StringList(vec!["a".to_string(), "b".to_string()])
    );

    let map = ContextValue::try_from(json!({ "k": "v" })).unwrap();
    assert_eq!(map.to_json(), json!({ "k": "v" }));
  }

  #[test]
  fn test_rejects_unsupported_shapes() {
    assert!(ContextValue::try_from(json!(null)).is_err());
    assert!(ContextValue::try_from(json!(["a", 1])).is_err());
    assert!(ContextValue::try_from(json!({ "nested": { "k": "v" } })).is_err());
  }

  #[test]
  fn test_untagged_serde() {
    let value: ContextValue = serde_json::from_value(json!(42)).unwrap();
    assert_eq!(value, ContextValue::Integer(42));

    let encoded = serde_json::to_value(ContextValue::from("hello")).unwrap();
    assert_eq!(encoded, json!("hello"));
  }

  #[test]
  fn test_large_unsigned_falls_back_to_float() {
    assert_eq!(ContextValue::from(7u64), ContextValue::Integer(7));
    assert_eq!(
      ContextValue::from(i64::MAX as u64),
      ContextValue::Integer(i64::MAX)
    );
    assert_eq!(
      ContextValue::from(u64::MAX),
      ContextValue::Float(u64::MAX as f64)
    );
    assert_eq!(
      ContextValue::from(u64::MAX),
      ContextValue::try_from(json!(u64::MAX)).unwrap()
    );
  }
}
