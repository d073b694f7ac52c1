//! Authorization.
//!
//! Context building compares one request header with a static secret and records the configured
//! identity when they are exactly equal. Execution is refused with `Unauthorized` when no identity
//! was recorded. There is no expiry, scoping or rotation of the secret.

use std::ops::ControlFlow;

use http::HeaderName;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use crate::context::Context;
use crate::context::Identity;
use crate::context::TransportInput;
use crate::error::PipelineError;
use crate::execution::ExecutionArgs;
use crate::plugin::HookFlow;
use crate::plugin::OnExecuteDone;
use crate::plugin::Plugin;
use crate::plugin::PluginInit;

pub(crate) const NAME: &str = "authorization";

/// Authorization configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The header carrying the credential.
    pub header_name: String,
    /// The only accepted credential, compared byte for byte.
    pub expected_value: String,
    /// Name of the identity attached to authorized requests.
    pub identity: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_name: "authorization".to_string(),
            expected_value: "Bearer secret-token".to_string(),
            identity: "Admin".to_string(),
        }
    }
}

/// Attaches an identity to requests presenting the secret, and refuses to execute the others.
#[derive(Debug)]
pub struct Authorization {
    header_name: HeaderName,
    expected_value: String,
    identity: Identity,
}

impl Authorization {
    fn authenticate(&self, input: &TransportInput) -> Option<Identity> {
        let token = input.headers.get(&self.header_name)?;
        (token.as_bytes() == self.expected_value.as_bytes()).then(|| self.identity.clone())
    }
}

#[async_trait::async_trait]
impl Plugin for Authorization {
    type Config = Config;

    async fn new(init: PluginInit<Self::Config>) -> Result<Self, BoxError> {
        let header_name = HeaderName::try_from(init.config.header_name.as_str())?;
        Ok(Authorization {
            header_name,
            expected_value: init.config.expected_value,
            identity: Identity::new(init.config.identity),
        })
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn on_context_building(&self, context: &mut Context, input: &TransportInput) -> HookFlow {
        context.user = self.authenticate(input);
        ControlFlow::Continue(())
    }

    fn on_execute(&self, args: &ExecutionArgs) -> HookFlow<Option<OnExecuteDone>> {
        if args.context.user.is_none() {
            tracing::debug!(
                operation_name = args.operation_label(),
                "refusing to execute an unauthenticated request"
            );
            return ControlFlow::Break(PipelineError::Unauthorized);
        }
        ControlFlow::Continue(None)
    }
}
