//! Starts a server that will handle http graphql requests.
//!
//! Every request goes through a [`Pipeline`]: context building, parsing, validation and
//! execution, each wrapped by the hooks of an ordered list of plugins.

#![warn(unreachable_pub)]

pub mod json_ext;

mod axum_factory;
mod cache;
pub mod configuration;
mod context;
pub mod demo;
pub mod error;
mod executable;
pub mod execution;
pub mod graphql;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
mod spec;

pub use axum_factory::make_router;
pub use configuration::Configuration;
pub use context::Context;
pub use context::Identity;
pub use context::TransportInput;
pub use error::PipelineError;
pub use executable::Executable;
pub use executable::main;
pub use pipeline::Pipeline;
pub use spec::ParsedDocument;
pub use spec::QueryHash;
pub use spec::Schema;
pub use spec::SchemaHash;
