//! Serialized access to an [`EventRouter`] from concurrent producers.
//!
//! The `WorkflowActor` owns the router and processes commands from an mpsc
//! channel one at a time. Producers hold cheap, cloneable
//! [`WorkflowHandle`]s and await replies over oneshot channels.

use std::sync::Arc;

use onex_core::WorkflowState;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::RouterError;
use crate::handler::EventData;
use crate::outcome::ProcessOutcome;
use crate::router::EventRouter;

type ProcessReply = Result<Option<ProcessOutcome>, RouterError>;

enum Command {
  Process {
    event_type: String,
    event_data: EventData,
    reply: oneshot::Sender<ProcessReply>,
  },
  Snapshot {
    reply: oneshot::Sender<Arc<WorkflowState>>,
  },
}

/// Owns an [`EventRouter`] and applies events in arrival order.
///
/// # Usage
///
/// ```ignore
/// let (actor, handle) = WorkflowActor::new(router);
///
/// let cancel = CancellationToken::new();
/// tokio::spawn(actor.run(cancel.clone()));
///
/// let outcome = handle.process_event("user.created", data).await?;
/// ```
pub struct WorkflowActor {
  router: EventRouter,
  receiver: mpsc::Receiver<Command>,
}

impl WorkflowActor {
  pub fn new(router: EventRouter) -> (Self, WorkflowHandle) {
    Self::with_buffer_size(router, 100)
  }

  pub fn with_buffer_size(router: EventRouter, buffer_size: usize) -> (Self, WorkflowHandle) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Self { router, receiver }, WorkflowHandle { sender })
  }

  /// Run the command loop.
  ///
  /// Exits when the token is cancelled or every handle has been dropped, and
  /// gives the router back so its final state can be inspected.
  pub async fn run(mut self, cancel: CancellationToken) -> EventRouter {
    info!(workflow_id = %self.router.workflow_id(), "starting workflow actor");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(workflow_id = %self.router.workflow_id(), "workflow actor cancelled");
          break;
        }
        command = self.receiver.recv() => {
          match command {
            Some(command) => self.dispatch(command),
            None => {
              info!(workflow_id = %self.router.workflow_id(), "workflow actor channel closed");
              break;
            }
          }
        }
      }
    }

    self.router
  }

  fn dispatch(&mut self, command: Command) {
    match command {
      Command::Process {
        event_type,
        event_data,
        reply,
      } => {
        let result = self.router.process_event(&event_type, &event_data);
        if reply.send(result).is_err() {
          warn!(
            workflow_id = %self.router.workflow_id(),
            event_type = %event_type,
            "caller went away before the outcome was delivered"
          );
        }
      }
      Command::Snapshot { reply } => {
        // Caller may have given up waiting
        let _ = reply.send(self.router.current_state());
      }
    }
  }
}

/// Cloneable handle for sending events to a [`WorkflowActor`].
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
  sender: mpsc::Sender<Command>,
}

impl WorkflowHandle {
  /// Route an event through the actor and wait for its outcome.
  pub async fn process_event(
    &self,
    event_type: impl Into<String>,
    event_data: EventData,
  ) -> Result<Option<ProcessOutcome>, RouterError> {
    let (reply, receiver) = oneshot::channel();
    self
      .sender
      .send(Command::Process {
        event_type: event_type.into(),
        event_data,
        reply,
      })
      .await
      .map_err(|_| RouterError::ActorStopped)?;

    receiver.await.map_err(|_| RouterError::ActorStopped)?
  }

  /// Snapshot of the actor's current state.
  pub async fn current_state(&self) -> Result<Arc<WorkflowState>, RouterError> {
    let (reply, receiver) = oneshot::channel();
    self
      .sender
      .send(Command::Snapshot { reply })
      .await
      .map_err(|_| RouterError::ActorStopped)?;

    receiver.await.map_err(|_| RouterError::ActorStopped)
  }

  /// Whether the actor has stopped receiving.
  pub fn is_closed(&self) -> bool {
    self.sender.is_closed()
  }
}

impl std::fmt::Debug for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Command::Process { event_type, .. } => f
        .debug_struct("Process")
        .field("event_type", event_type)
        .finish_non_exhaustive(),
      Command::Snapshot { .. } => f.write_str("Snapshot"),
    }
  }
}
