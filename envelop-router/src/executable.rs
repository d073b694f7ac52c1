//! Main entry point for CLI command to start server.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::axum_factory::make_router;
use crate::configuration::Configuration;
use crate::configuration::generate_config_schema;
use crate::demo;
use crate::demo::DemoResolvers;
use crate::execution::RootResolver;
use crate::spec::Schema;

/// Options for the server
#[derive(Parser, Debug)]
#[command(name = "envelop", about = "GraphQL server with a pluggable request pipeline")]
pub(crate) struct Opt {
    /// Log level, as an `EnvFilter` directive (off|error|warn|info|debug|trace).
    #[arg(
        long = "log",
        default_value = "info",
        alias = "log-level",
        env = "ENVELOP_LOG"
    )]
    log_level: String,

    /// Configuration location relative to the current directory.
    #[arg(short, long = "config", env = "ENVELOP_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Schema location relative to the current directory. Defaults to the bundled demo schema.
    #[arg(short, long = "schema-path", env = "ENVELOP_SCHEMA_PATH")]
    schema_path: Option<PathBuf>,

    /// Prints the configuration schema.
    #[arg(long)]
    schema: bool,
}

/// This is the main server entrypoint.
pub fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(Executable::builder().start())
}

/// Entry point into creating a server executable.
pub struct Executable {}

#[buildstructor::buildstructor]
impl Executable {
    /// Build an executable that will parse commandline options, set up logging and serve
    /// requests until Ctrl-C is received.
    ///
    /// The bundled demo resolvers are used unless `root` is supplied, in which case the schema
    /// passed with `--schema-path` should match them.
    #[builder(entry = "builder", exit = "start")]
    pub async fn start(root: Option<Arc<dyn RootResolver>>) -> Result<()> {
        let opt = Opt::parse();

        if opt.schema {
            let schema = generate_config_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(());
        }

        let builder = tracing_subscriber::fmt::fmt().with_env_filter(
            EnvFilter::try_new(&opt.log_level).context("could not parse log configuration")?,
        );
        if std::io::stdout().is_terminal() {
            tracing::subscriber::set_global_default(builder.finish())?;
        } else {
            tracing::subscriber::set_global_default(builder.json().finish())?;
        }

        let configuration = match &opt.config_path {
            Some(path) => Configuration::read(path)?,
            None => Configuration::default(),
        };

        let sdl = match &opt.schema_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("could not read schema file {}", path.display()))?,
            None => demo::SCHEMA.to_string(),
        };
        let schema = Arc::new(Schema::parse(&sdl)?);

        let root = root.unwrap_or_else(|| Arc::new(DemoResolvers));
        let pipeline = configuration.create_pipeline(schema, root).await?;
        tracing::info!(plugins = ?pipeline.plugin_names(), "pipeline ready");

        let router = make_router(Arc::new(pipeline), &configuration.server);
        let listener = tokio::net::TcpListener::bind(configuration.server.listen)
            .await
            .with_context(|| format!("could not listen on {}", configuration.server.listen))?;
        tracing::info!(
            "GraphQL endpoint exposed at http://{}{} 🚀",
            listener.local_addr()?,
            configuration.server.graphql_path
        );

        if let Err(err) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            tracing::error!("{}", err);
            return Err(err.into());
        }
        tracing::info!("stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for the shutdown signal: {}", err);
    }
}
