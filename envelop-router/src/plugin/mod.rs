//! Plugin system.
//!
//! A plugin is an independent unit that observes and influences a request through a fixed set of
//! hooks. The pipeline only knows the hook shapes and their ordering contract:
//!
//! * before hooks run in registration order and may abort their phase with a [`PipelineError`],
//! * after hooks are collected during the before phase and run in reverse registration order,
//!   observing the result without being able to change it.
//!
//! Plugins are written against the typed [`Plugin`] trait and stored by the pipeline as
//! [`DynPlugin`] trait objects.

#[cfg(test)]
pub(crate) mod test;

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::validation::Valid;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tower::BoxError;

use crate::context::Context;
use crate::context::TransportInput;
use crate::error::PipelineError;
use crate::error::ParseErrors;
use crate::error::VALIDATION_FAILED_CODE;
use crate::execution::ExecutionArgs;
use crate::graphql;
use crate::spec::ParsedDocument;
use crate::spec::Schema;

/// What a before hook decides: carry on with a value, or abort the phase.
pub type HookFlow<T = ()> = ControlFlow<PipelineError, T>;

/// After hook observing the execution result.
pub type OnExecuteDone = AfterHook<graphql::Response>;

/// After hook observing the validation outcome.
pub type OnValidateDone = AfterHook<ValidationOutcome>;

/// Initialisation parameters passed to a plugin when it is created.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PluginInit<T> {
    /// Configuration
    pub config: T,
    /// The schema the pipeline serves.
    pub schema: Arc<Schema>,
}

impl<T> PluginInit<T> {
    /// Create a new PluginInit for the supplied config and schema.
    pub fn new(config: T, schema: Arc<Schema>) -> Self {
        Self { config, schema }
    }
}

/// All plugins must implement the Plugin trait.
///
/// Every hook has a no-op default, so a plugin only implements the ones it cares about.
#[async_trait]
pub trait Plugin: Send + Sync + 'static + Sized {
    /// The configuration for this plugin.
    /// Typically a `struct` with `#[derive(serde::Deserialize)]`.
    type Config: JsonSchema + DeserializeOwned + Send;

    /// This is invoked once after the configuration is loaded.
    async fn new(init: PluginInit<Self::Config>) -> Result<Self, BoxError>;

    /// Name used in logs and error attributions.
    fn name(&self) -> &'static str {
        get_type_of(self)
    }

    /// Reads the transport and writes into the request context.
    ///
    /// Later plugins see the writes of earlier ones. Breaking aborts context building.
    fn on_context_building(&self, _context: &mut Context, _input: &TransportInput) -> HookFlow {
        ControlFlow::Continue(())
    }

    /// Runs before the document is validated against the schema.
    ///
    /// A plugin may provide the outcome with [`ValidateParams::set_result`], in which case the
    /// structural validation is skipped.
    fn on_validate(&self, _params: &mut ValidateParams<'_>) -> HookFlow<Option<OnValidateDone>> {
        ControlFlow::Continue(None)
    }

    /// Runs before execution. Breaking aborts the execution before any resolver runs.
    fn on_execute(&self, _args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        ControlFlow::Continue(None)
    }
}

fn get_type_of<T>(_: &T) -> &'static str {
    std::any::type_name::<T>()
}

/// Object safe version of [`Plugin`], used by the pipeline.
///
/// There is no need to implement it by hand: every [`Plugin`] is a `DynPlugin`.
pub trait DynPlugin: Send + Sync + 'static {
    /// Name used in logs and error attributions.
    fn name(&self) -> &'static str;

    /// See [`Plugin::on_context_building`].
    fn on_context_building(&self, context: &mut Context, input: &TransportInput) -> HookFlow;

    /// See [`Plugin::on_validate`].
    fn on_validate(&self, params: &mut ValidateParams<'_>) -> HookFlow<Option<OnValidateDone>>;

    /// See [`Plugin::on_execute`].
    fn on_execute(&self, args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>>;
}

impl<T> DynPlugin for T
where
    T: Plugin,
{
    fn name(&self) -> &'static str {
        Plugin::name(self)
    }

    fn on_context_building(&self, context: &mut Context, input: &TransportInput) -> HookFlow {
        Plugin::on_context_building(self, context, input)
    }

    fn on_validate(&self, params: &mut ValidateParams<'_>) -> HookFlow<Option<OnValidateDone>> {
        Plugin::on_validate(self, params)
    }

    fn on_execute(&self, args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        Plugin::on_execute(self, args)
    }
}

/// A callback run once the wrapped operation produced its result.
///
/// It receives the result by reference: it can observe it but not replace it. Returning an error
/// (or panicking) is reported by the pipeline and has no effect on the result.
pub struct AfterHook<T> {
    hook: Box<dyn FnOnce(&T) -> Result<(), BoxError> + Send>,
}

impl<T> AfterHook<T> {
    /// Wraps a closure.
    pub fn new<F>(hook: F) -> Self
    where
        F: FnOnce(&T) -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            hook: Box::new(hook),
        }
    }

    pub(crate) fn call(self, result: &T) -> Result<(), BoxError> {
        (self.hook)(result)
    }
}

impl<T> fmt::Debug for AfterHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AfterHook").finish_non_exhaustive()
    }
}

/// The outcome of validating a document against a schema.
///
/// Both outcomes are shareable, so a cached outcome can be handed out to any number of requests.
#[derive(Clone, Debug)]
pub enum ValidationOutcome {
    /// The document is valid and can be executed.
    Valid(Arc<Valid<ExecutableDocument>>),
    /// The document is invalid; the errors are reported to the caller.
    Invalid(Arc<Vec<graphql::Error>>),
}

impl ValidationOutcome {
    /// Runs the structural validation of `document` against `schema`.
    pub fn validate(schema: &Schema, document: &ParsedDocument) -> Self {
        match document.ast().to_executable_validate(schema.definitions()) {
            Ok(executable) => ValidationOutcome::Valid(Arc::new(executable)),
            Err(invalid) => ValidationOutcome::Invalid(Arc::new(
                ParseErrors {
                    errors: invalid.errors,
                }
                .to_graphql_errors(VALIDATION_FAILED_CODE),
            )),
        }
    }

    /// Whether the document passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// The executable document, or the validation failure.
    pub fn into_result(self) -> Result<Arc<Valid<ExecutableDocument>>, PipelineError> {
        match self {
            ValidationOutcome::Valid(executable) => Ok(executable),
            ValidationOutcome::Invalid(errors) => {
                Err(PipelineError::Validation(errors.as_ref().clone()))
            }
        }
    }
}

/// Arguments of the validation hooks.
pub struct ValidateParams<'a> {
    /// The schema the document is validated against.
    pub schema: &'a Schema,
    /// The parsed document.
    pub document: &'a ParsedDocument,
    result: Option<ValidationOutcome>,
}

impl<'a> ValidateParams<'a> {
    pub(crate) fn new(schema: &'a Schema, document: &'a ParsedDocument) -> Self {
        Self {
            schema,
            document,
            result: None,
        }
    }

    /// Provides the validation outcome, skipping the structural validation.
    pub fn set_result(&mut self, outcome: ValidationOutcome) {
        self.result = Some(outcome);
    }

    /// The outcome provided by an earlier hook, if any.
    pub fn result(&self) -> Option<&ValidationOutcome> {
        self.result.as_ref()
    }

    pub(crate) fn take_result(&mut self) -> Option<ValidationOutcome> {
        self.result.take()
    }
}

impl fmt::Debug for ValidateParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateParams")
            .field("document", self.document.hash())
            .field("short_circuited", &self.result.is_some())
            .finish()
    }
}
