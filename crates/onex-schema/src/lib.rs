//! Onex Schema
//!
//! Schema loading and validation for workflow metadata. Validation is a
//! precondition the router applies to candidate metadata before committing a
//! new state; it is never part of a reducer.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::{SchemaError, ValidationError};
pub use loader::{FsSchemaLoader, InMemorySchemaLoader, SchemaLoader};
pub use schema::{MetadataSchema, SchemaType, extract_schema_types};
pub use validator::{AcceptAll, JsonSchemaValidator, SchemaValidator};
