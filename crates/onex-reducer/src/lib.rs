//! Onex Reducer
//!
//! The [`Reducer`] trait maps `(state, action)` to the next state. Reducers are
//! pure and synchronous: one action is applied at a time, validity is decided
//! by a deterministic predicate, and the input state is never touched.
//!
//! [`RuleReducer`] is a data-driven implementation configured from the rules
//! of a `WorkflowDef`.

mod error;
mod reducer;
mod rule;

pub use error::ReduceError;
pub use reducer::Reducer;
pub use rule::RuleReducer;
