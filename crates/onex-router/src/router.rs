//! Event routing.
//!
//! The `EventRouter` turns inbound events into state transitions:
//! handler dispatch, action construction, reduction, optional schema
//! validation, then commit. It is the only owner of the current state.

use std::sync::Arc;

use onex_config::WorkflowDef;
use onex_core::{Action, Context, ErrorInfo, NodeResult, WorkflowState};
use onex_log::{Logger, TracingLogger};
use onex_reducer::{Reducer, RuleReducer};
use onex_schema::{JsonSchemaValidator, SchemaLoader, SchemaValidator};
use tracing::{debug, instrument};

use crate::error::RouterError;
use crate::events::{NoopNotifier, RouterEvent, RouterNotifier};
use crate::handler::{EventData, Handler, HandlerRegistry, HandlerResponse};
use crate::outcome::ProcessOutcome;
use crate::template::TemplateHandler;

/// Routes events for a single workflow instance.
///
/// Events are processed one at a time: [`process_event`](Self::process_event)
/// takes `&mut self`, so concurrent producers must go through a
/// [`WorkflowActor`](crate::WorkflowActor) or their own lock. States handed
/// out are immutable snapshots and stay valid after later commits.
pub struct EventRouter {
  workflow_id: String,
  reducer: Arc<dyn Reducer>,
  handlers: HandlerRegistry,
  validator: Option<Arc<dyn SchemaValidator>>,
  logger: Arc<dyn Logger>,
  notifier: Arc<dyn RouterNotifier>,
  current: Arc<WorkflowState>,
}

impl EventRouter {
  /// Create a router starting from the reducer's initial state.
  pub fn new(workflow_id: impl Into<String>, reducer: Arc<dyn Reducer>) -> Self {
    let current = Arc::new(reducer.initial_state());
    Self {
      workflow_id: workflow_id.into(),
      reducer,
      handlers: HandlerRegistry::new(),
      validator: None,
      logger: Arc::new(TracingLogger::default()),
      notifier: Arc::new(NoopNotifier),
      current,
    }
  }

  /// Build a router from a workflow definition: a [`RuleReducer`] over the
  /// definition's rules, one [`TemplateHandler`] per route, and a
  /// [`JsonSchemaValidator`] when a metadata schema is declared inline.
  ///
  /// A definition naming its schema through `metadata_schema_ref` must be
  /// built with [`from_def_with_loader`](Self::from_def_with_loader).
  pub fn from_def(def: &WorkflowDef) -> Result<Self, RouterError> {
    if let Some(name) = &def.metadata_schema_ref {
      return Err(RouterError::UnresolvedSchema(name.clone()));
    }

    let mut router = Self::from_def_unvalidated(def)?;
    if let Some(schema) = &def.metadata_schema {
      router.install_validator(JsonSchemaValidator::from_json(schema)?)?;
    }

    Ok(router)
  }

  /// Like [`from_def`](Self::from_def), resolving `metadata_schema_ref`
  /// through `loader`.
  pub async fn from_def_with_loader(
    def: &WorkflowDef,
    loader: &dyn SchemaLoader,
  ) -> Result<Self, RouterError> {
    let Some(name) = &def.metadata_schema_ref else {
      return Self::from_def(def);
    };

    let schema = loader.load(name).await?;
    debug!(workflow_id = %def.workflow_id, schema = %name, "loaded metadata schema");

    let mut router = Self::from_def_unvalidated(def)?;
    router.install_validator(JsonSchemaValidator::new(schema)?)?;
    Ok(router)
  }

  fn from_def_unvalidated(def: &WorkflowDef) -> Result<Self, RouterError> {
    let reducer: Arc<dyn Reducer> = Arc::new(RuleReducer::from_def(def));
    let mut router = Self::new(def.workflow_id.clone(), reducer);

    for route in &def.routes {
      router.register_handler(Arc::new(TemplateHandler::new(route.clone())?));
    }

    Ok(router)
  }

  /// The initial state must already satisfy the schema.
  fn install_validator(&mut self, validator: JsonSchemaValidator) -> Result<(), RouterError> {
    validator
      .validate(self.current.metadata())
      .map_err(RouterError::InvalidInitialState)?;
    self.validator = Some(Arc::new(validator));
    Ok(())
  }

  pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
    self.register_handler(handler);
    self
  }

  /// Handlers are consulted in registration order.
  pub fn register_handler(&mut self, handler: Arc<dyn Handler>) {
    self.handlers.register(handler);
  }

  pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
    self.validator = Some(validator);
    self
  }

  pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
    self.logger = logger;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn RouterNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  /// Snapshot of the current state.
  pub fn current_state(&self) -> Arc<WorkflowState> {
    Arc::clone(&self.current)
  }

  pub fn reducer(&self) -> &Arc<dyn Reducer> {
    &self.reducer
  }

  /// Route one event.
  ///
  /// Returns `Ok(None)` when no handler claims the event or the handler
  /// declines it. Otherwise the handler response becomes an [`Action`]
  /// (`action_type` and `operation` = `event_type`, `target_id` from the event
  /// data) and is reduced against the current state. A rejected action yields
  /// a failed outcome and leaves the state untouched.
  ///
  /// Handler failures are returned as [`RouterError::Handler`] without retry.
  #[instrument(
    name = "router_process_event",
    skip(self, event_data),
    fields(
      workflow_id = %self.workflow_id,
      event_type = %event_type,
    )
  )]
  pub fn process_event(
    &mut self,
    event_type: &str,
    event_data: &EventData,
  ) -> Result<Option<ProcessOutcome>, RouterError> {
    let correlation_id = correlation_id_for(event_data);
    let mut context = Context::new();
    context.insert("workflow_id".to_string(), self.workflow_id.as_str().into());
    context.insert("event_type".to_string(), event_type.into());
    context.insert("version".to_string(), self.current.version().into());

    self.logger.debug("event received", &correlation_id, &context);
    self.notifier.notify(RouterEvent::EventReceived {
      workflow_id: self.workflow_id.clone(),
      correlation_id: correlation_id.clone(),
      event_type: event_type.to_string(),
    });

    let Some(handler) = self.handlers.find(event_type) else {
      self.ignore("no handler for event", event_type, &correlation_id, &context);
      return Ok(None);
    };

    let response = match handler.handle_event(event_type, event_data) {
      Ok(Some(response)) => response,
      Ok(None) => {
        self.ignore("handler declined event", event_type, &correlation_id, &context);
        return Ok(None);
      }
      Err(source) => {
        context.insert("error".to_string(), source.message.as_str().into());
        context.insert("retryable".to_string(), source.retryable.into());
        self.logger.error("handler failed", &correlation_id, &context);
        self.notifier.notify(RouterEvent::HandlerFailed {
          workflow_id: self.workflow_id.clone(),
          correlation_id,
          event_type: event_type.to_string(),
          error: source.message.clone(),
        });
        return Err(RouterError::Handler {
          event_type: event_type.to_string(),
          source,
        });
      }
    };

    let target_id = event_data
      .get("target_id")
      .and_then(|v| v.as_str())
      .unwrap_or_default();
    let action = Action::new(event_type, target_id, event_type, response.clone()).map_err(
      |source| RouterError::MalformedAction {
        event_type: event_type.to_string(),
        source,
      },
    )?;

    context.insert("action_id".to_string(), action.action_id().to_string().into());
    context.insert("target_id".to_string(), target_id.into());

    let reduced = self
      .reducer
      .reduce(&self.current, &action)
      .map_err(ErrorInfo::from)
      .and_then(|next| match &self.validator {
        Some(validator) => validator
          .validate(next.metadata())
          .map(|()| next)
          .map_err(|e| ErrorInfo::validation_failure(e.to_string())),
        None => Ok(next),
      });

    let provenance = vec![self.stage(), self.reducer.name().to_string()];

    let outcome = match reduced {
      Ok(next) => {
        let next = next.with_provenance(provenance.clone());
        let result = provenance
          .into_iter()
          .fold(NodeResult::success(response), NodeResult::with_stage)
          .with_state_delta(self.current.delta_to(&next));

        self.current = Arc::new(next);

        context.insert("version".to_string(), self.current.version().into());
        self.logger.info("transition applied", &correlation_id, &context);
        self.notifier.notify(RouterEvent::TransitionApplied {
          workflow_id: self.workflow_id.clone(),
          correlation_id,
          action_type: action.action_type().to_string(),
          target_id: action.target_id().to_string(),
          version: self.current.version(),
        });

        ProcessOutcome::new(action, Arc::clone(&self.current), result)
      }
      Err(error) => {
        context.insert("error_kind".to_string(), error.kind.to_string().into());
        context.insert("error".to_string(), error.message.as_str().into());
        self.logger.warn("transition rejected", &correlation_id, &context);
        self.notifier.notify(RouterEvent::TransitionRejected {
          workflow_id: self.workflow_id.clone(),
          correlation_id,
          action_type: action.action_type().to_string(),
          target_id: action.target_id().to_string(),
          kind: error.kind,
          error: error.message.clone(),
        });

        let result: NodeResult<HandlerResponse> = provenance
          .into_iter()
          .fold(NodeResult::failure(error), NodeResult::with_stage);

        ProcessOutcome::new(action, Arc::clone(&self.current), result)
      }
    };

    debug!(
      processed = outcome.processed(),
      version = self.current.version(),
      "event routed"
    );

    Ok(Some(outcome))
  }

  /// Route a sequence of events in order.
  ///
  /// Stops at the first error; outcomes of events routed before it are
  /// committed either way. Replaying the same events through a fresh router
  /// reproduces the same metadata and versions.
  pub fn replay<I, S>(&mut self, events: I) -> Result<Vec<Option<ProcessOutcome>>, RouterError>
  where
    I: IntoIterator<Item = (S, EventData)>,
    S: AsRef<str>,
  {
    events
      .into_iter()
      .map(|(event_type, event_data)| self.process_event(event_type.as_ref(), &event_data))
      .collect()
  }

  fn stage(&self) -> String {
    format!("{}.router", self.workflow_id)
  }

  fn ignore(&self, message: &str, event_type: &str, correlation_id: &str, context: &Context) {
    self.logger.debug(message, correlation_id, context);
    self.notifier.notify(RouterEvent::EventIgnored {
      workflow_id: self.workflow_id.clone(),
      correlation_id: correlation_id.to_string(),
      event_type: event_type.to_string(),
    });
  }
}

impl std::fmt::Debug for EventRouter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EventRouter")
      .field("workflow_id", &self.workflow_id)
      .field("reducer", &self.reducer.name())
      .field("handlers", &self.handlers)
      .field("version", &self.current.version())
      .finish_non_exhaustive()
  }
}

/// Caller-supplied `correlation_id`, or a fresh one.
fn correlation_id_for(event_data: &EventData) -> String {
  event_data
    .get("correlation_id")
    .and_then(|v| v.as_str())
    .filter(|id| !id.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

