//! The request pipeline.
//!
//! A [`Pipeline`] owns the schema, the root resolvers and the ordered plugin list. It knows nothing
//! about what the plugins do, only the hook shapes and their ordering:
//!
//! 1. context building: `on_context_building` of every plugin, in registration order,
//! 2. parsing,
//! 3. validation: `on_validate` before hooks, then the validation itself unless a hook provided
//!    the outcome, then the after hooks in reverse order,
//! 4. execution: `on_execute` before hooks, then the resolvers, then the after hooks in reverse
//!    order.
//!
//! The first before hook that breaks terminates the request. After hooks collected so far in that
//! phase are dropped without running.

mod after_hooks;

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::ast::OperationType;
use apollo_compiler::validation::Valid;

use self::after_hooks::AfterHookStack;
use crate::context::Context;
use crate::context::TransportInput;
use crate::error::PipelineError;
use crate::execution;
use crate::execution::ExecutionArgs;
use crate::execution::RootResolver;
use crate::graphql;
use crate::plugin::DynPlugin;
use crate::plugin::ValidateParams;
use crate::plugin::ValidationOutcome;
use crate::spec::ParsedDocument;
use crate::spec::Schema;
use crate::spec::query::DEFAULT_RECURSION_LIMIT;

/// Runs GraphQL requests through the registered plugins.
///
/// The plugin list is fixed at construction and shared read-only between requests.
pub struct Pipeline {
    schema: Arc<Schema>,
    root: Arc<dyn RootResolver>,
    plugins: Vec<Arc<dyn DynPlugin>>,
    parser_recursion_limit: usize,
}

#[buildstructor::buildstructor]
impl Pipeline {
    /// Builds a pipeline. Plugins run in the order they are added.
    #[builder(visibility = "pub")]
    fn new(
        schema: Arc<Schema>,
        root: Arc<dyn RootResolver>,
        plugins: Vec<Arc<dyn DynPlugin>>,
        parser_recursion_limit: Option<usize>,
    ) -> Self {
        Self {
            schema,
            root,
            plugins,
            parser_recursion_limit: parser_recursion_limit.unwrap_or(DEFAULT_RECURSION_LIMIT),
        }
    }
}

impl Pipeline {
    /// The schema requests are validated and executed against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Names of the registered plugins, in registration order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Creates the context of a request and lets every plugin write into it.
    pub fn build_context(&self, input: &TransportInput) -> Result<Context, PipelineError> {
        let mut context = Context::new(input);
        for plugin in &self.plugins {
            if let ControlFlow::Break(error) = plugin.on_context_building(&mut context, input) {
                tracing::debug!(plugin = plugin.name(), %error, "context building aborted");
                return Err(match error {
                    error @ PipelineError::ContextBuild { .. } => error,
                    other => PipelineError::context_build(plugin.name(), other),
                });
            }
        }
        Ok(context)
    }

    /// Parses the query text of a request.
    pub fn parse(&self, request: &graphql::Request) -> Result<ParsedDocument, PipelineError> {
        let query = request.query.as_deref().ok_or(PipelineError::MissingQuery)?;
        Ok(ParsedDocument::parse(query, self.parser_recursion_limit)?)
    }

    /// Validates a parsed document against the schema.
    pub fn validate(
        &self,
        document: &ParsedDocument,
    ) -> Result<Arc<Valid<ExecutableDocument>>, PipelineError> {
        let mut params = ValidateParams::new(&self.schema, document);
        let mut after_hooks = AfterHookStack::new();
        for plugin in &self.plugins {
            match plugin.on_validate(&mut params) {
                ControlFlow::Continue(Some(hook)) => after_hooks.push(plugin.name(), hook),
                ControlFlow::Continue(None) => {}
                ControlFlow::Break(error) => {
                    tracing::debug!(plugin = plugin.name(), %error, "validation aborted");
                    return Err(error);
                }
            }
        }
        let outcome = match params.take_result() {
            Some(outcome) => outcome,
            None => ValidationOutcome::validate(&self.schema, document),
        };
        after_hooks.unwind(&outcome);
        outcome.into_result()
    }

    /// Executes a validated request.
    ///
    /// The response may carry errors next to partial data: those come from the resolvers and are
    /// not pipeline failures.
    pub fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, PipelineError> {
        if args.operation_type() == Some(OperationType::Subscription) {
            return Err(PipelineError::UnsupportedOperation(
                "subscription".to_string(),
            ));
        }
        let mut after_hooks = AfterHookStack::new();
        for plugin in &self.plugins {
            match plugin.on_execute(&args) {
                ControlFlow::Continue(Some(hook)) => after_hooks.push(plugin.name(), hook),
                ControlFlow::Continue(None) => {}
                ControlFlow::Break(error) => {
                    tracing::debug!(plugin = plugin.name(), %error, "execution aborted");
                    return Err(error);
                }
            }
        }
        let response = execution::execute(&args);
        after_hooks.unwind(&response);
        Ok(response)
    }

    /// Runs a request end to end.
    pub fn process(
        &self,
        input: &TransportInput,
        request: graphql::Request,
    ) -> Result<graphql::Response, PipelineError> {
        let span = tracing::info_span!(
            "graphql_request",
            operation_name = request.operation_name.as_deref().unwrap_or_default()
        );
        let _guard = span.enter();

        let context = self.build_context(input)?;
        let document = self.parse(&request)?;
        let executable = self.validate(&document)?;
        self.execute(ExecutionArgs {
            schema: self.schema.clone(),
            document: executable,
            root: self.root.clone(),
            variables: request.variables,
            operation_name: request.operation_name,
            context,
        })
    }

    /// Runs a request end to end. Failures are turned into an `{errors: [...]}` response.
    pub fn run(&self, input: &TransportInput, request: graphql::Request) -> graphql::Response {
        self.process(input, request)
            .unwrap_or_else(|error| error.to_response())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("schema", &self.schema)
            .field("plugins", &self.plugin_names())
            .field("parser_recursion_limit", &self.parser_recursion_limit)
            .finish_non_exhaustive()
    }
}
