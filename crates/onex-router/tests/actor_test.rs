use std::sync::Arc;
use std::time::Duration;

use onex_config::{EffectDef, RuleDef};
use onex_core::{SchemaVersion, StateMetadata};
use onex_reducer::RuleReducer;
use onex_router::{EventData, EventRouter, FnHandler, RouterError, WorkflowActor};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn data(value: serde_json::Value) -> EventData {
  value.as_object().cloned().unwrap()
}

/// Every `tick` appends to the target's counter object.
fn counter_router() -> EventRouter {
  let reducer = RuleReducer::new(StateMetadata::new(Default::default(), SchemaVersion::default()))
    .with_rule(
      "tick",
      RuleDef {
        guards: vec![],
        effect: EffectDef::UpsertTarget,
      },
    );

  EventRouter::new("counter", Arc::new(reducer)).with_handler(Arc::new(FnHandler::new(
    "tick",
    |_, event| Ok(Some(data(json!({ "last": event.get("n").cloned() })))),
  )))
}

#[tokio::test]
async fn test_concurrent_producers_are_serialized() {
  let (actor, handle) = WorkflowActor::new(counter_router());
  let cancel = CancellationToken::new();
  let task = tokio::spawn(actor.run(cancel.clone()));

  let mut producers = Vec::new();
  for n in 0..20 {
    let handle = handle.clone();
    producers.push(tokio::spawn(async move {
      handle
        .process_event("tick", data(json!({ "target_id": "c", "n": n })))
        .await
    }));
  }

  let mut versions = Vec::new();
  for producer in producers {
    let outcome = producer.await.unwrap().unwrap().unwrap();
    assert!(outcome.processed());
    versions.push(outcome.state().version());
  }

  // each event committed exactly one distinct version
  versions.sort_unstable();
  assert_eq!(versions, (1..=20).collect::<Vec<u64>>());

  let state = handle.current_state().await.unwrap();
  assert_eq!(state.version(), 20);

  cancel.cancel();
  let router = task.await.unwrap();
  assert_eq!(router.current_state().version(), 20);
}

#[tokio::test]
async fn test_actor_stops_when_handles_dropped() {
  let (actor, handle) = WorkflowActor::new(counter_router());
  let task = tokio::spawn(actor.run(CancellationToken::new()));

  handle
    .process_event("tick", data(json!({ "target_id": "c", "n": 1 })))
    .await
    .unwrap();
  drop(handle);

  let router = tokio::time::timeout(Duration::from_secs(5), task)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(router.current_state().version(), 1);
}

#[tokio::test]
async fn test_handle_errors_after_cancel() {
  let (actor, handle) = WorkflowActor::with_buffer_size(counter_router(), 4);
  let cancel = CancellationToken::new();
  let task = tokio::spawn(actor.run(cancel.clone()));

  cancel.cancel();
  task.await.unwrap();

  assert!(handle.is_closed());
  let err = handle
    .process_event("tick", data(json!({ "target_id": "c" })))
    .await
    .unwrap_err();
  assert!(matches!(err, RouterError::ActorStopped));
  assert!(matches!(
    handle.current_state().await.unwrap_err(),
    RouterError::ActorStopped
  ));
}

#[tokio::test]
async fn test_noop_events_through_actor() {
  let (actor, handle) = WorkflowActor::new(counter_router());
  let cancel = CancellationToken::new();
  let task = tokio::spawn(actor.run(cancel.clone()));

  let outcome = handle
    .process_event("unknown", data(json!({ "target_id": "c" })))
    .await
    .unwrap();
  assert!(outcome.is_none());
  assert_eq!(handle.current_state().await.unwrap().version(), 0);

  cancel.cancel();
  task.await.unwrap();
}
