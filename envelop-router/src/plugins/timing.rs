//! Reports the duration of every execution.

use std::ops::ControlFlow;
use std::time::Instant;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use crate::execution::ExecutionArgs;
use crate::graphql;
use crate::plugin::AfterHook;
use crate::plugin::HookFlow;
use crate::plugin::OnExecuteDone;
use crate::plugin::Plugin;
use crate::plugin::PluginInit;

pub(crate) const NAME: &str = "timing";

/// Timing configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {}

/// Measures the time between its before hook and its after hook.
#[derive(Debug)]
pub struct Timing;

#[async_trait::async_trait]
impl Plugin for Timing {
    type Config = Config;

    async fn new(_init: PluginInit<Self::Config>) -> Result<Self, BoxError> {
        Ok(Timing)
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn on_execute(&self, args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        let start = Instant::now();
        let operation_name = args.operation_label().to_string();
        ControlFlow::Continue(Some(AfterHook::new(
            move |_response: &graphql::Response| {
                tracing::info!(
                    operation_name = %operation_name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "GraphQL operation executed"
                );
                Ok(())
            },
        )))
    }
}
