#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub(crate) mod query;
mod schema;

pub use query::ParsedDocument;
pub use query::QueryHash;
pub use schema::Schema;
pub use schema::SchemaHash;
