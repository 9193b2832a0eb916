//! Onex Core
//!
//! Value types shared by every onex crate:
//! - [`NodeResult`]: the monadic outcome of a node operation (success or
//!   failure, trust score, provenance, state delta)
//! - [`Action`]: an immutable command describing an intended transition
//! - [`WorkflowState`]: an immutable, versioned snapshot of workflow state
//! - [`ErrorInfo`]: failure detail with retry guidance
//! - [`ContextValue`]: the closed set of values allowed in log/error context
//!
//! Nothing here performs I/O. All types are `Send + Sync` and cheap to clone.

mod action;
mod error;
mod result;
mod state;
mod value;

pub use action::{Action, Parameters};
pub use error::{BackoffStrategy, CoreError, ErrorInfo, ErrorKind};
pub use result::{NodeResult, StateDelta};
pub use state::{MetadataValues, SchemaVersion, StateMetadata, WorkflowState};
pub use value::{Context, ContextValue};
