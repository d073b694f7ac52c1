//! GraphQL schema.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use apollo_compiler::validation::Valid;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::error::ParseErrors;
use crate::error::SchemaError;

/// A validated GraphQL schema, together with the identity used to key caches.
pub struct Schema {
    pub(crate) definitions: Valid<apollo_compiler::Schema>,
    pub(crate) schema_id: SchemaHash,
}

impl Schema {
    /// Parses and validates schema definition language.
    pub fn parse(raw_sdl: &str) -> Result<Self, SchemaError> {
        let start = Instant::now();
        let mut parser = apollo_compiler::parser::Parser::new();
        let result = parser.parse_ast(raw_sdl, "schema.graphql");

        // Trace log recursion limit data
        let recursion_limit = parser.recursion_reached();
        tracing::trace!(?recursion_limit, "recursion limit data");

        let definitions = result
            .map_err(|invalid| {
                SchemaError::Parse(ParseErrors {
                    errors: invalid.errors,
                })
            })?
            .to_schema_validate()
            .map_err(|invalid| {
                SchemaError::Validate(ParseErrors {
                    errors: invalid.errors,
                })
            })?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "schema loaded"
        );

        Ok(Schema {
            schema_id: Schema::schema_id(raw_sdl),
            definitions,
        })
    }

    pub(crate) fn schema_id(sdl: &str) -> SchemaHash {
        SchemaHash::new(sdl)
    }

    /// The hash identifying this schema in cache keys.
    pub fn id(&self) -> &SchemaHash {
        &self.schema_id
    }

    /// The validated `apollo-compiler` schema.
    pub fn definitions(&self) -> &Valid<apollo_compiler::Schema> {
        &self.definitions
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("schema_id", &self.schema_id)
            .finish_non_exhaustive()
    }
}

/// A schema ID is the hash of the schema text.
///
/// That means that differences in whitespace and comments affect the hash, not only semantic
/// differences in the schema.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaHash(Arc<String>);

impl SchemaHash {
    pub(crate) fn new(sdl: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sdl);
        let hash = format!("{:x}", hasher.finalize());
        Self(Arc::new(hash))
    }

    /// Return the hash as a hexadecimal string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SchemaHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}
