//! Declarative handlers rendered from route definitions.
//!
//! Each response field is a minijinja template evaluated against the event
//! data. Rendered strings are then coerced to the type the route's response
//! schema declares for that field (string when undeclared).

use std::collections::HashMap;

use minijinja::{AutoEscape, Environment, Value};
use onex_config::RouteDef;
use onex_schema::{SchemaType, extract_schema_types};

use crate::error::{HandlerError, RouterError};
use crate::handler::{EventData, Handler, HandlerResponse};

/// A [`Handler`] driven by a [`RouteDef`].
#[derive(Debug)]
pub struct TemplateHandler {
  route: RouteDef,
  schema_types: HashMap<String, SchemaType>,
  env: Environment<'static>,
}

impl TemplateHandler {
  /// Compile a route. Fails if any response template has a syntax error.
  pub fn new(route: RouteDef) -> Result<Self, RouterError> {
    let mut env = Environment::new();
    // keys like "body.html" must not pick an escaping mode from their suffix
    env.set_auto_escape_callback(|_| AutoEscape::None);

    for (key, template) in &route.response {
      env
        .add_template_owned(key.clone(), template.clone())
        .map_err(|e| RouterError::InvalidRoute {
          event_type: route.event_type.clone(),
          message: format!("template for '{}' does not compile: {}", key, e),
        })?;
    }

    let schema_types = route
      .response_schema
      .as_ref()
      .map(extract_schema_types)
      .unwrap_or_default();

    Ok(Self {
      route,
      schema_types,
      env,
    })
  }

  pub fn route(&self) -> &RouteDef {
    &self.route
  }

  /// Templates are registered under their response key.
  fn render(&self, key: &str, context: &Value) -> Result<String, HandlerError> {
    self
      .env
      .get_template(key)
      .and_then(|template| template.render(context))
      .map_err(|e| HandlerError::new(format!("failed to render '{}': {}", key, e)))
  }
}

impl Handler for TemplateHandler {
  fn can_handle(&self, event_type: &str) -> bool {
    self.route.event_type == event_type
  }

  fn handle_event(
    &self,
    _event_type: &str,
    event_data: &EventData,
  ) -> Result<Option<HandlerResponse>, HandlerError> {
    let missing = self
      .route
      .required_fields
      .iter()
      .any(|field| event_data.get(field).is_none_or(|v| v.is_null()));
    if missing {
      return Ok(None);
    }

    let context = Value::from_serialize(event_data);
    let mut response = HandlerResponse::new();

    for key in self.route.response.keys() {
      let rendered = self.render(key, &context)?;
      let schema_type = self.schema_types.get(key).unwrap_or(&SchemaType::String);
      response.insert(key.clone(), coerce_value(key, &rendered, schema_type)?);
    }

    Ok(Some(response))
  }
}

/// Coerce a rendered string to a typed JSON value.
fn coerce_value(
  key: &str,
  value: &str,
  schema_type: &SchemaType,
) -> Result<serde_json::Value, HandlerError> {
  let mismatch =
    |expected: &str| HandlerError::new(format!("'{}' expected {}, got '{}'", key, expected, value));

  match schema_type {
    SchemaType::String => Ok(serde_json::Value::String(value.to_string())),

    SchemaType::Number => value
      .trim()
      .parse::<f64>()
      .ok()
      .and_then(serde_json::Number::from_f64)
      .map(serde_json::Value::Number)
      .ok_or_else(|| mismatch("number")),

    SchemaType::Integer => value
      .trim()
      .parse::<i64>()
      .map(|n| serde_json::Value::Number(n.into()))
      .map_err(|_| mismatch("integer")),

    SchemaType::Boolean => match value.trim().to_lowercase().as_str() {
      "true" => Ok(serde_json::Value::Bool(true)),
      "false" => Ok(serde_json::Value::Bool(false)),
      _ => Err(mismatch("boolean")),
    },

    SchemaType::Null => match value.trim() {
      "" | "null" | "none" => Ok(serde_json::Value::Null),
      _ => Err(mismatch("null")),
    },

    SchemaType::Array => match serde_json::from_str(value) {
      Ok(v @ serde_json::Value::Array(_)) => Ok(v),
      _ => Err(mismatch("array")),
    },

    SchemaType::Object => match serde_json::from_str(value) {
      Ok(v @ serde_json::Value::Object(_)) => Ok(v),
      _ => Err(mismatch("object")),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn route(value: serde_json::Value) -> RouteDef {
    serde_json::from_value(value).unwrap()
  }

  fn data(value: serde_json::Value) -> EventData {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn test_renders_response_from_event_data() {
    let handler = TemplateHandler::new(route(json!({
      "event_type": "user.created",
      "response": {
        "status": "welcome_email_sent",
        "greeting": "Welcome {{ name | title }}!"
      }
    })))
    .unwrap();

    assert!(handler.can_handle("user.created"));
    assert!(!handler.can_handle("user.deleted"));

    let response = handler
      .handle_event("user.created", &data(json!({ "target_id": "u1", "name": "ada lovelace" })))
      .unwrap()
      .unwrap();

    assert_eq!(response["status"], json!("welcome_email_sent"));
    assert_eq!(response["greeting"], json!("Welcome Ada Lovelace!"));
  }

  #[test]
  fn test_missing_required_field_is_noop() {
    let handler = TemplateHandler::new(route(json!({
      "event_type": "user.updated",
      "required_fields": ["email"],
      "response": { "email": "{{ email }}" }
    })))
    .unwrap();

    let response = handler
      .handle_event("user.updated", &data(json!({ "target_id": "u1" })))
      .unwrap();
    assert!(response.is_none());

    let response = handler
      .handle_event("user.updated", &data(json!({ "target_id": "u1", "email": null })))
      .unwrap();
    assert!(response.is_none());
  }

  #[test]
  fn test_coerces_with_response_schema() {
    let handler = TemplateHandler::new(route(json!({
      "event_type": "order.placed",
      "response": {
        "quantity": "{{ qty }}",
        "total": "{{ qty * price }}",
        "gift": "{{ gift }}",
        "items": "{{ items | tojson }}"
      },
      "response_schema": {
        "type": "object",
        "properties": {
          "quantity": { "type": "integer" },
          "total": { "type": "number" },
          "gift": { "type": "boolean" },
          "items": { "type": "array" }
        }
      }
    })))
    .unwrap();

    let response = handler
      .handle_event(
        "order.placed",
        &data(json!({ "qty": 3, "price": 2.5, "gift": true, "items": ["a", "b"] })),
      )
      .unwrap()
      .unwrap();

    assert_eq!(response["quantity"], json!(3));
    assert_eq!(response["total"], json!(7.5));
    assert_eq!(response["gift"], json!(true));
    assert_eq!(response["items"], json!(["a", "b"]));
  }

  #[test]
  fn test_coercion_failure_is_handler_error() {
    let handler = TemplateHandler::new(route(json!({
      "event_type": "order.placed",
      "response": { "quantity": "{{ qty }}" },
      "response_schema": { "properties": { "quantity": { "type": "integer" } } }
    })))
    .unwrap();

    let err = handler
      .handle_event("order.placed", &data(json!({ "qty": "lots" })))
      .unwrap_err();
    assert!(err.message.contains("expected integer"));
    assert!(!err.retryable);
  }

  #[test]
  fn test_templates_registered_once_by_key() {
    let handler = TemplateHandler::new(route(json!({
      "event_type": "page.rendered",
      "response": {
        "body.html": "<p>{{ name }}</p>",
        "count": "{{ n }}"
      }
    })))
    .unwrap();

    assert!(handler.env.get_template("body.html").is_ok());
    assert!(handler.env.get_template("count").is_ok());

    for n in 0..3 {
      let response = handler
        .handle_event("page.rendered", &data(json!({ "name": "<Ada>", "n": n })))
        .unwrap()
        .unwrap();
      assert_eq!(response["body.html"], json!("<p><Ada></p>"));
      assert_eq!(response["count"], json!(n.to_string()));
    }
  }

  #[test]
  fn test_invalid_template_rejected() {
    let err = TemplateHandler::new(route(json!({
      "event_type": "broken",
      "response": { "x": "{{ unclosed" }
    })))
    .unwrap_err();

    assert!(matches!(err, RouterError::InvalidRoute { .. }));
  }
}
