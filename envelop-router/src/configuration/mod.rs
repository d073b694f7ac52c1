//! Logic for loading configuration in to an object model
#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::execution::RootResolver;
use crate::pipeline::Pipeline;
use crate::plugin::DynPlugin;
use crate::plugins::PluginConf;
use crate::spec::Schema;
use crate::spec::query::DEFAULT_RECURSION_LIMIT;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration file {path}: {error}
    ReadFile {
        /// The file.
        path: String,
        /// The io error.
        error: std::io::Error,
    },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
    /// plugin {plugin} could not be configured: {error}
    PluginConfiguration {
        /// Name of the plugin.
        plugin: String,
        /// Why its construction failed.
        error: String,
    },
    /// {message}: {error}
    InvalidConfiguration {
        /// What is invalid.
        message: &'static str,
        /// Details.
        error: String,
    },
}

/// The configuration for the router.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with `serde_json::json!` and `serde_json::from_value`.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Configuration options pertaining to the http server component.
    #[serde(default)]
    pub server: Server,

    /// Plugins, in registration order.
    #[serde(default = "PluginConf::default_list")]
    pub plugins: Vec<PluginConf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            server: Server::default(),
            plugins: PluginConf::default_list(),
        }
    }
}

impl Configuration {
    /// Reads a YAML configuration file.
    pub fn read(path: &std::path::Path) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path).map_err(|error| ConfigurationError::ReadFile {
            path: path.display().to_string(),
            error,
        })?;
        raw.parse()
    }

    /// Checks constraints the deserializer can not express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (message, path) in [
            ("invalid 'server.graphql_path'", &self.server.graphql_path),
            (
                "invalid 'server.health_check_path'",
                &self.server.health_check_path,
            ),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigurationError::InvalidConfiguration {
                    message,
                    error: format!("'{path}' must start with '/'"),
                });
            }
        }
        if self.server.graphql_path == self.server.health_check_path {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'server' paths",
                error: format!(
                    "graphql and health check are both served on '{}'",
                    self.server.graphql_path
                ),
            });
        }
        Ok(())
    }

    /// Instantiates the configured plugins, in order.
    pub async fn create_plugins(
        &self,
        schema: &Arc<Schema>,
    ) -> Result<Vec<Arc<dyn DynPlugin>>, ConfigurationError> {
        let mut plugins = Vec::with_capacity(self.plugins.len());
        for conf in &self.plugins {
            let plugin = conf.create(schema).await.map_err(|error| {
                ConfigurationError::PluginConfiguration {
                    plugin: conf.name().to_string(),
                    error: error.to_string(),
                }
            })?;
            tracing::debug!(plugin = plugin.name(), "plugin created");
            plugins.push(plugin);
        }
        Ok(plugins)
    }

    /// Builds the pipeline serving `schema` with the configured plugins.
    pub async fn create_pipeline(
        &self,
        schema: Arc<Schema>,
        root: Arc<dyn RootResolver>,
    ) -> Result<Pipeline, ConfigurationError> {
        let plugins = self.create_plugins(&schema).await?;
        Ok(Pipeline::builder()
            .schema(schema)
            .root(root)
            .plugins(plugins)
            .parser_recursion_limit(self.server.parser_recursion_limit)
            .build())
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let configuration: Configuration = if s.trim().is_empty() {
            Configuration::default()
        } else {
            serde_yaml::from_str(s).map_err(ConfigurationError::DeserializeConfigError)?
        };
        configuration.validate()?;
        Ok(configuration)
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
        s.inline_subschemas = true;
    });
    let generator = settings.into_generator();
    generator.into_root_schema_for::<Configuration>()
}

/// Configuration options pertaining to the http server component.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Server {
    /// The socket address and port to listen on.
    /// Defaults to 127.0.0.1:8080
    pub listen: SocketAddr,

    /// The path GraphQL requests are posted to.
    /// Defaults to /graphql
    pub graphql_path: String,

    /// The path of the health check endpoint.
    /// Defaults to /health
    pub health_check_path: String,

    /// Serve the GraphiQL page on `GET /`.
    /// Defaults to true
    pub landing_page: bool,

    /// Maximum nesting depth accepted by the GraphQL parser.
    /// Defaults to 500
    pub parser_recursion_limit: usize,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            graphql_path: "/graphql".to_string(),
            health_check_path: "/health".to_string(),
            landing_page: true,
            parser_recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}
