//! Event handlers and handler dispatch.

use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;

/// Inbound event payload. `target_id` and `correlation_id` have meaning to
/// the router; everything else belongs to the handler.
pub type EventData = serde_json::Map<String, serde_json::Value>;

/// Handler output. Becomes the parameters of the derived action.
pub type HandlerResponse = serde_json::Map<String, serde_json::Value>;

/// Turns an inbound event into a response, or declines it.
///
/// Handlers run synchronously and must finish (or fail) before returning.
/// Replaying an identical event should produce an equivalent response.
pub trait Handler: Send + Sync {
  fn can_handle(&self, event_type: &str) -> bool;

  /// `Ok(None)` means the event is a no-op.
  fn handle_event(
    &self,
    event_type: &str,
    event_data: &EventData,
  ) -> Result<Option<HandlerResponse>, HandlerError>;
}

type HandlerFn =
  dyn Fn(&str, &EventData) -> Result<Option<HandlerResponse>, HandlerError> + Send + Sync;

/// A handler backed by a closure.
pub struct FnHandler {
  event_types: Option<Vec<String>>,
  handler: Box<HandlerFn>,
}

impl FnHandler {
  /// Handle a single event type.
  pub fn new<F>(event_type: impl Into<String>, handler: F) -> Self
  where
    F: Fn(&str, &EventData) -> Result<Option<HandlerResponse>, HandlerError> + Send + Sync + 'static,
  {
    Self {
      event_types: Some(vec![event_type.into()]),
      handler: Box::new(handler),
    }
  }

  /// Handle every event type.
  pub fn any<F>(handler: F) -> Self
  where
    F: Fn(&str, &EventData) -> Result<Option<HandlerResponse>, HandlerError> + Send + Sync + 'static,
  {
    Self {
      event_types: None,
      handler: Box::new(handler),
    }
  }
}

impl fmt::Debug for FnHandler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnHandler")
      .field("event_types", &self.event_types)
      .finish_non_exhaustive()
  }
}

impl Handler for FnHandler {
  fn can_handle(&self, event_type: &str) -> bool {
    match &self.event_types {
      Some(types) => types.iter().any(|t| t == event_type),
      None => true,
    }
  }

  fn handle_event(
    &self,
    event_type: &str,
    event_data: &EventData,
  ) -> Result<Option<HandlerResponse>, HandlerError> {
    (self.handler)(event_type, event_data)
  }
}

/// Ordered set of handlers. The first one that can handle an event wins.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
  handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, handler: Arc<dyn Handler>) {
    self.handlers.push(handler);
  }

  /// The handler responsible for `event_type`, if any.
  pub fn find(&self, event_type: &str) -> Option<&dyn Handler> {
    self
      .handlers
      .iter()
      .find(|h| h.can_handle(event_type))
      .map(|h| h.as_ref())
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

impl fmt::Debug for HandlerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HandlerRegistry")
      .field("handlers", &self.handlers.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn respond(value: serde_json::Value) -> Result<Option<HandlerResponse>, HandlerError> {
    Ok(value.as_object().cloned())
  }

  #[test]
  fn test_fn_handler_matches_event_type() {
    let handler = FnHandler::new("user.created", |_, _| respond(json!({ "ok": true })));

    assert!(handler.can_handle("user.created"));
    assert!(!handler.can_handle("user.updated"));

    let response = handler
      .handle_event("user.created", &EventData::new())
      .unwrap()
      .unwrap();
    assert_eq!(response["ok"], json!(true));
  }

  #[test]
  fn test_registry_first_match_wins() {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(FnHandler::new("a", |_, _| respond(json!({ "from": "specific" })))));
    registry.register(Arc::new(FnHandler::any(|_, _| respond(json!({ "from": "fallback" })))));

    assert_eq!(registry.len(), 2);

    let specific = registry.find("a").unwrap();
    let response = specific.handle_event("a", &EventData::new()).unwrap().unwrap();
    assert_eq!(response["from"], "specific");

    let fallback = registry.find("b").unwrap();
    let response = fallback.handle_event("b", &EventData::new()).unwrap().unwrap();
    assert_eq!(response["from"], "fallback");
  }

  #[test]
  fn test_empty_registry() {
    let registry = HandlerRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.find("anything").is_none());
  }
}
