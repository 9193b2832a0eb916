//! Onex Log
//!
//! The [`Logger`] collaborator: a structured sink taking a level, message,
//! correlation id and context map. [`TracingLogger`] forwards to `tracing`,
//! [`MemoryLogger`] keeps records for inspection, [`NoopLogger`] drops them.

mod logger;

pub use logger::{LogLevel, LogRecord, Logger, MemoryLogger, NoopLogger, TracingLogger};
