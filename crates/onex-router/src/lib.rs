//! Onex Router
//!
//! Dispatches inbound events to handlers, turns handler responses into
//! actions, and commits the states a reducer derives from them.
//!
//! - [`EventRouter`]: single-owner router over one workflow instance
//! - [`WorkflowActor`]: serializes events from concurrent producers
//! - [`TemplateHandler`]: declarative handler built from a route definition

mod actor;
mod error;
mod events;
mod handler;
mod outcome;
mod router;
mod template;

pub use actor::{WorkflowActor, WorkflowHandle};
pub use error::{HandlerError, RouterError};
pub use events::{ChannelNotifier, NoopNotifier, RouterEvent, RouterNotifier};
pub use handler::{EventData, FnHandler, Handler, HandlerRegistry, HandlerResponse};
pub use outcome::ProcessOutcome;
pub use router::EventRouter;
pub use template::TemplateHandler;
