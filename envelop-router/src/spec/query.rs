//! Parsed GraphQL documents.

use std::sync::Arc;

use apollo_compiler::ast;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::error::ParseErrors;

/// Default nesting depth accepted by the parser.
pub(crate) const DEFAULT_RECURSION_LIMIT: usize = 500;

/// A syntactically valid GraphQL document that has not been validated yet.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub(crate) ast: Arc<ast::Document>,
    pub(crate) hash: QueryHash,
}

impl ParsedDocument {
    /// Parses query text, without looking at any schema.
    pub fn parse(query: &str, recursion_limit: usize) -> Result<Self, ParseErrors> {
        let mut parser = apollo_compiler::parser::Parser::new().recursion_limit(recursion_limit);
        let result = parser.parse_ast(query, "query.graphql");

        // Trace log recursion limit data
        let recursion_limit = parser.recursion_reached();
        tracing::trace!(?recursion_limit, "recursion limit data");

        let ast = result.map_err(|invalid| ParseErrors {
            errors: invalid.errors,
        })?;
        let hash = QueryHash::new(query);
        Ok(Self {
            ast: Arc::new(ast),
            hash,
        })
    }

    /// The parsed syntax tree.
    pub fn ast(&self) -> &ast::Document {
        &self.ast
    }

    /// Structural hash of the document.
    pub fn hash(&self) -> &QueryHash {
        &self.hash
    }
}

/// The hash of the text a document was parsed from.
///
/// Validation errors and execution errors carry source locations, so two texts that only differ
/// in whitespace are distinct documents.
#[derive(Clone, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryHash(#[serde(with = "hex")] Vec<u8>);

impl QueryHash {
    fn new(query: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query);
        Self(hasher.finalize().as_slice().into())
    }
}

impl std::fmt::Debug for QueryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueryHash")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl std::fmt::Display for QueryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_hash() {
        let first = ParsedDocument::parse("{ user(id: \"2\") { name } }", 100).unwrap();
        let second = ParsedDocument::parse("{ user(id: \"2\") { name } }", 100).unwrap();
        assert_eq!(first.hash(), second.hash());
    }

    #[test]
    fn whitespace_changes_the_hash() {
        let compact = ParsedDocument::parse("{ user(id: \"2\") { name } }", 100).unwrap();
        let spread = ParsedDocument::parse(
            "{\n  user(id: \"2\") {\n    name\n  }\n}\n",
            100,
        )
        .unwrap();
        assert_ne!(compact.hash(), spread.hash());
    }

    #[test]
    fn different_selections_hash_differently() {
        let hello = ParsedDocument::parse("{ hello }", 100).unwrap();
        let users = ParsedDocument::parse("{ users { id } }", 100).unwrap();
        assert_ne!(hello.hash(), users.hash());
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let error = ParsedDocument::parse("{ hello", 100).unwrap_err();
        assert!(!error.errors.is_empty());
    }

    #[test]
    fn recursion_limit_is_enforced() {
        let deep = format!("{}{}", "{ a ".repeat(50), "}".repeat(50));
        assert!(ParsedDocument::parse(&deep, 10).is_err());
        assert!(ParsedDocument::parse(&deep, 200).is_ok());
    }
}
