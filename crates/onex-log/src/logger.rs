use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use onex_core::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LogLevel::Trace => "trace",
      LogLevel::Debug => "debug",
      LogLevel::Info => "info",
      LogLevel::Warn => "warn",
      LogLevel::Error => "error",
    };
    f.write_str(name)
  }
}

/// A single structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
  pub level: LogLevel,
  pub message: String,
  pub correlation_id: String,
  #[serde(default)]
  pub context: Context,
  pub timestamp: DateTime<Utc>,
}

/// Structured log sink used by the router around each processing step.
///
/// Implementations must not fail or block for long; logging never affects
/// processing results.
pub trait Logger: Send + Sync {
  /// Record a message.
  fn log(&self, level: LogLevel, message: &str, correlation_id: &str, context: &Context);

  fn debug(&self, message: &str, correlation_id: &str, context: &Context) {
    self.log(LogLevel::Debug, message, correlation_id, context);
  }

  fn info(&self, message: &str, correlation_id: &str, context: &Context) {
    self.log(LogLevel::Info, message, correlation_id, context);
  }

  fn warn(&self, message: &str, correlation_id: &str, context: &Context) {
    self.log(LogLevel::Warn, message, correlation_id, context);
  }

  fn error(&self, message: &str, correlation_id: &str, context: &Context) {
    self.log(LogLevel::Error, message, correlation_id, context);
  }
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
  component: String,
}

impl TracingLogger {
  pub fn new(component: impl Into<String>) -> Self {
    Self {
      component: component.into(),
    }
  }
}

impl Default for TracingLogger {
  fn default() -> Self {
    Self::new("onex")
  }
}

fn render_context(context: &Context) -> String {
  let map: serde_json::Map<String, serde_json::Value> = context
    .iter()
    .map(|(k, v)| (k.clone(), v.to_json()))
    .collect();
  serde_json::Value::Object(map).to_string()
}

impl Logger for TracingLogger {
  fn log(&self, level: LogLevel, message: &str, correlation_id: &str, context: &Context) {
    let component = self.component.as_str();
    let context = render_context(context);

    match level {
      LogLevel::Trace => {
        tracing::trace!(component, correlation_id, context = %context, "{}", message)
      }
      LogLevel::Debug => {
        tracing::debug!(component, correlation_id, context = %context, "{}", message)
      }
      LogLevel::Info => {
        tracing::info!(component, correlation_id, context = %context, "{}", message)
      }
      LogLevel::Warn => {
        tracing::warn!(component, correlation_id, context = %context, "{}", message)
      }
      LogLevel::Error => {
        tracing::error!(component, correlation_id, context = %context, "{}", message)
      }
    }
  }
}

/// Keeps records in memory.
///
/// Suitable for tests and for inspecting what a single run logged.
#[derive(Debug, Default)]
pub struct MemoryLogger {
  records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Snapshot of all records so far.
  pub fn records(&self) -> Vec<LogRecord> {
    self
      .records
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  /// Records sharing a correlation id, in logging order.
  pub fn records_for(&self, correlation_id: &str) -> Vec<LogRecord> {
    self
      .records()
      .into_iter()
      .filter(|r| r.correlation_id == correlation_id)
      .collect()
  }
}

impl Logger for MemoryLogger {
  fn log(&self, level: LogLevel, message: &str, correlation_id: &str, context: &Context) {
    let record = LogRecord {
      level,
      message: message.to_string(),
      correlation_id: correlation_id.to_string(),
      context: context.clone(),
      timestamp: Utc::now(),
    };

    self
      .records
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(record);
  }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
  fn log(&self, _level: LogLevel, _message: &str, _correlation_id: &str, _context: &Context) {}
}
