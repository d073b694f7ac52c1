//! Plugins and resolvers recording what the pipeline does with them.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use apollo_compiler::ast::OperationType;
use apollo_compiler::resolvers::FieldError;
use apollo_compiler::resolvers::ResolveInfo;
use apollo_compiler::resolvers::ResolvedValue;
use parking_lot::Mutex;
use tower::BoxError;

use super::AfterHook;
use super::HookFlow;
use super::OnExecuteDone;
use super::OnValidateDone;
use super::Plugin;
use super::PluginInit;
use super::ValidateParams;
use super::ValidationOutcome;
use crate::context::Context;
use crate::context::Identity;
use crate::context::TransportInput;
use crate::demo::DemoResolvers;
use crate::error::PipelineError;
use crate::execution::ExecutionArgs;
use crate::execution::RootResolver;
use crate::graphql;

/// Ordered record of hook invocations, shared by several plugins.
#[derive(Clone, Debug, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn record(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Where a [`RecordingPlugin`] fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Fault {
    #[default]
    Never,
    ContextBuilding,
    Validate,
    Execute,
    AfterExecute,
    PanicAfterExecute,
}

/// Records every hook invocation in a [`Journal`], as `<name>:<hook>`.
#[derive(Debug)]
pub(crate) struct RecordingPlugin {
    name: &'static str,
    journal: Journal,
    fault: Fault,
    identity: Option<&'static str>,
}

impl RecordingPlugin {
    pub(crate) fn named(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            fault: Fault::Never,
            identity: None,
        }
    }

    pub(crate) fn failing(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    /// Attaches `name` as the user of the context it builds.
    pub(crate) fn identifying(mut self, name: &'static str) -> Self {
        self.identity = Some(name);
        self
    }

    fn record(&self, hook: &str) {
        self.journal.record(format!("{}:{hook}", self.name));
    }
}

#[async_trait::async_trait]
impl Plugin for RecordingPlugin {
    type Config = ();

    async fn new(_init: PluginInit<Self::Config>) -> Result<Self, BoxError> {
        Ok(Self::named("recording", &Journal::default()))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn on_context_building(&self, context: &mut Context, _input: &TransportInput) -> HookFlow {
        self.record("context");
        if let Some(user) = &context.user {
            self.record(&format!("saw:{}", user.name));
        }
        if self.fault == Fault::ContextBuilding {
            return ControlFlow::Break(PipelineError::context_build(self.name, "refused"));
        }
        if let Some(name) = self.identity {
            context.user = Some(Identity::new(name));
        }
        ControlFlow::Continue(())
    }

    fn on_validate(&self, _params: &mut ValidateParams<'_>) -> HookFlow<Option<OnValidateDone>> {
        self.record("validate");
        if self.fault == Fault::Validate {
            return ControlFlow::Break(PipelineError::validation_aborted(self.name, "refused"));
        }
        let journal = self.journal.clone();
        let name = self.name;
        ControlFlow::Continue(Some(AfterHook::new(
            move |outcome: &ValidationOutcome| {
                journal.record(format!("{name}:validated:{}", outcome.is_valid()));
                Ok(())
            },
        )))
    }

    fn on_execute(&self, _args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        self.record("execute");
        if self.fault == Fault::Execute {
            return ControlFlow::Break(PipelineError::aborted(self.name, "refused"));
        }
        let journal = self.journal.clone();
        let name = self.name;
        let fault = self.fault;
        ControlFlow::Continue(Some(AfterHook::new(
            move |response: &graphql::Response| {
                journal.record(format!("{name}:executed:{}", response.has_errors()));
                match fault {
                    Fault::AfterExecute => Err("after hook refused".into()),
                    Fault::PanicAfterExecute => panic!("after hook panicked"),
                    _ => Ok(()),
                }
            },
        )))
    }
}

/// The bundled resolvers, counting root field resolutions.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingResolver {
    inner: DemoResolvers,
    calls: Arc<AtomicUsize>,
}

impl CountingResolver {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RootResolver for CountingResolver {
    fn resolve_root_field<'a>(
        &'a self,
        operation_type: OperationType,
        context: &'a Context,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_root_field(operation_type, context, info)
    }
}
