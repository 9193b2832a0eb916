use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use onex_config::WorkflowDef;
use onex_envelope::{JsonSerializer, create_envelope, encode};
use onex_router::{EventData, EventRouter, WorkflowActor};
use onex_schema::FsSchemaLoader;

/// Onex - event-driven workflow state machines
#[derive(Parser)]
#[command(name = "onex")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log level used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "warn")]
  log_level: String,

  /// Write logs as JSON lines
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Route a stream of events through a workflow
  Run {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,

    /// JSON-lines file of events (default: stdin)
    #[arg(long)]
    events: Option<PathBuf>,
  },

  /// Validate a workflow definition and its initial metadata
  Check {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,
  },
}

/// One line of an events file.
#[derive(Debug, Deserialize)]
struct EventLine {
  event_type: String,
  #[serde(default)]
  data: EventData,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(&cli.log_level, cli.json);

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      events,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_workflow(workflow_file, events))?;
    }
    Some(Commands::Check { workflow_file }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(check_workflow(&workflow_file))?;
    }
    None => {
      println!("onex - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
  let registry = tracing_subscriber::registry().with(env_filter);

  // stdout carries outcomes, so logs go to stderr
  if json {
    registry
      .with(fmt::layer().json().with_writer(io::stderr))
      .init();
  } else {
    registry.with(fmt::layer().with_writer(io::stderr)).init();
  }
}

/// Load a definition; a `metadata_schema_ref` names `<ref>.json` in the
/// workflow file's directory.
async fn load_workflow(workflow_file: &Path) -> Result<(WorkflowDef, EventRouter)> {
  let def = WorkflowDef::from_file(workflow_file)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))?;

  let schema_dir = workflow_file.parent().unwrap_or_else(|| Path::new("."));
  let loader = FsSchemaLoader::new(schema_dir);

  let router = EventRouter::from_def_with_loader(&def, &loader)
    .await
    .with_context(|| format!("failed to build workflow '{}'", def.workflow_id))?;

  Ok((def, router))
}

async fn check_workflow(workflow_file: &Path) -> Result<()> {
  let (def, router) = load_workflow(workflow_file).await?;

  println!(
    "{}: ok ({} rules, {} routes, schema {})",
    def.workflow_id,
    def.rules.len(),
    def.routes.len(),
    router.current_state().schema_version()
  );

  Ok(())
}

async fn run_workflow(workflow_file: PathBuf, events_file: Option<PathBuf>) -> Result<()> {
  let (def, router) = load_workflow(&workflow_file).await?;
  eprintln!("Loaded workflow: {}", def.name);

  let events = read_events(events_file.as_deref()).await?;
  eprintln!("Events: {}", events.len());

  let (actor, handle) = WorkflowActor::new(router);
  let cancel = CancellationToken::new();
  let actor_task = tokio::spawn(actor.run(cancel.clone()));

  for (n, event) in events.into_iter().enumerate() {
    let event_type = event.event_type;
    let outcome = match handle.process_event(event_type.clone(), event.data).await {
      Ok(outcome) => outcome,
      Err(e) => {
        cancel.cancel();
        return Err(e).with_context(|| format!("event {} ('{}') failed", n + 1, event_type));
      }
    };

    match outcome {
      Some(outcome) => println!("{}", outcome.to_json()?),
      None => println!(
        "{}",
        serde_json::json!({ "processed": false, "ignored": true, "event_type": event_type })
      ),
    }
  }

  // Closing the last handle stops the actor once it has drained
  drop(handle);
  let router = actor_task.await.context("workflow actor panicked")?;
  let state = router.current_state();

  info!(
    workflow_id = %def.workflow_id,
    version = state.version(),
    "workflow run finished"
  );

  let envelope = create_envelope(state.as_ref(), "workflow_state", def.workflow_id.as_str())?;
  let encoded = encode(&JsonSerializer::pretty(), &envelope);
  match (encoded.success, encoded.data) {
    (true, Some(data)) => println!("{}", data),
    _ => bail!(
      "failed to encode final state: {}",
      encoded.error_message.unwrap_or_default()
    ),
  }

  Ok(())
}

async fn read_events(events_file: Option<&Path>) -> Result<Vec<EventLine>> {
  let content = match events_file {
    Some(path) => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read events file: {}", path.display()))?,
    None => read_stdin()?,
  };

  content
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(i, line)| {
      serde_json::from_str(line).with_context(|| format!("invalid event on line {}", i + 1))
    })
    .collect()
}

fn read_stdin() -> Result<String> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, no events
    return Ok(String::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read events from stdin")?;
  Ok(input)
}
