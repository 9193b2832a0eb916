//! Router events and notifiers for observability.
//!
//! Events are emitted while an event is routed so consumers can observe
//! progress, persist an audit trail, stream to UIs, etc.

use onex_core::ErrorKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by the [`EventRouter`](crate::EventRouter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouterEvent {
  /// An event reached the router.
  EventReceived {
    workflow_id: String,
    correlation_id: String,
    event_type: String,
  },

  /// No handler claimed the event, or the handler declined it.
  EventIgnored {
    workflow_id: String,
    correlation_id: String,
    event_type: String,
  },

  /// A new state was committed.
  TransitionApplied {
    workflow_id: String,
    correlation_id: String,
    action_type: String,
    target_id: String,
    version: u64,
  },

  /// The action was rejected and state is unchanged.
  TransitionRejected {
    workflow_id: String,
    correlation_id: String,
    action_type: String,
    target_id: String,
    kind: ErrorKind,
    error: String,
  },

  /// The handler failed.
  HandlerFailed {
    workflow_id: String,
    correlation_id: String,
    event_type: String,
    error: String,
  },
}

/// Receives router events.
///
/// The router calls `notify` synchronously for each event; implementations
/// decide what to do with them.
pub trait RouterNotifier: Send + Sync {
  fn notify(&self, event: RouterEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RouterNotifier for NoopNotifier {
  fn notify(&self, _event: RouterEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls routing. Volume is a handful of
  // events per routed event.
  sender: mpsc::UnboundedSender<RouterEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RouterEvent>) -> Self {
    Self { sender }
  }
}

impl RouterNotifier for ChannelNotifier {
  fn notify(&self, event: RouterEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
