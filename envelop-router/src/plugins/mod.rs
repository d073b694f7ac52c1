//! Plugins implementing the features offered by the router.
//!
//! Each plugin is listed in the `plugins` section of the configuration. The list is ordered:
//! registration order is the order of the before hooks, and the reverse of the after hooks.

pub mod authorization;
pub mod logging;
pub mod timing;
pub mod validation_cache;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use crate::plugin::DynPlugin;
use crate::plugin::Plugin;
use crate::plugin::PluginInit;
use crate::spec::Schema;

/// One entry of the `plugins` list.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum PluginConf {
    /// Caches validation outcomes by schema and document hash.
    ValidationCache(validation_cache::Config),
    /// Reports how long each execution took.
    Timing(timing::Config),
    /// Reports incoming requests and their outcome.
    Logging(logging::Config),
    /// Gates execution on a static credential.
    Authorization(authorization::Config),
}

impl PluginConf {
    /// The plugin list used when the configuration does not provide one.
    pub fn default_list() -> Vec<PluginConf> {
        vec![
            PluginConf::ValidationCache(Default::default()),
            PluginConf::Timing(Default::default()),
            PluginConf::Logging(Default::default()),
            PluginConf::Authorization(Default::default()),
        ]
    }

    /// The name of the configured plugin.
    pub fn name(&self) -> &'static str {
        match self {
            PluginConf::ValidationCache(_) => validation_cache::NAME,
            PluginConf::Timing(_) => timing::NAME,
            PluginConf::Logging(_) => logging::NAME,
            PluginConf::Authorization(_) => authorization::NAME,
        }
    }

    /// Instantiates the configured plugin.
    pub async fn create(&self, schema: &Arc<Schema>) -> Result<Arc<dyn DynPlugin>, BoxError> {
        Ok(match self {
            PluginConf::ValidationCache(config) => {
                create::<validation_cache::ValidationCache>(config, schema).await?
            }
            PluginConf::Timing(config) => create::<timing::Timing>(config, schema).await?,
            PluginConf::Logging(config) => create::<logging::Logging>(config, schema).await?,
            PluginConf::Authorization(config) => {
                create::<authorization::Authorization>(config, schema).await?
            }
        })
    }
}

async fn create<P: Plugin>(
    config: &P::Config,
    schema: &Arc<Schema>,
) -> Result<Arc<dyn DynPlugin>, BoxError>
where
    P::Config: Clone,
{
    let plugin = P::new(PluginInit::new(config.clone(), schema.clone())).await?;
    Ok(Arc::new(plugin))
}
