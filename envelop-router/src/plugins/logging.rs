//! Reports incoming requests and whether they succeeded.

use std::ops::ControlFlow;

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

pub(crate) const NAME: &str = "logging";

/// Logging configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {}

/// Logs a request before execution and its outcome after.
#[derive(Debug)]
pub struct Logging;

#[async_trait::async_trait]
impl Plugin for Logging {
    type Config = Config;

    async fn new(_init: PluginInit<Self::Config>) -> Result<Self, BoxError> {
        Ok(Logging)
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn on_execute(&self, args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        let operation_name = args.operation_label().to_string();
        tracing::info!(operation_name = %operation_name, "incoming GraphQL request");
        ControlFlow::Continue(Some(AfterHook::new(
            move |response: &graphql::Response| {
                if response.has_errors() {
                    tracing::error!(
                        operation_name = %operation_name,
                        errors = ?response.errors,
                        "GraphQL request failed"
                    );
                } else {
                    tracing::info!(
                        operation_name = %operation_name,
                        "GraphQL request executed successfully"
                    );
                }
                Ok(())
            },
        )))
    }
}
