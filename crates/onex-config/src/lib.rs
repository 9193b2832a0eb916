//! Onex Config
//!
//! Serializable workflow definitions. A [`WorkflowDef`] describes the initial
//! metadata of a workflow, the transition rules its reducer enforces, and the
//! declarative routes that turn inbound events into handler responses.
//!
//! Definitions are plain JSON and are turned into a running router by
//! `onex-router`.

mod error;
mod route;
mod rule;
mod workflow;

pub use error::ConfigError;
pub use route::RouteDef;
pub use rule::{EffectDef, GuardDef, RuleDef};
pub use workflow::WorkflowDef;
