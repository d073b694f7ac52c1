//! JSON helpers shared by requests, responses and resolvers.
//!
//! The value types are the ones `apollo-compiler` executes against, so variables
//! and results flow between the HTTP layer and the executor without conversion.

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;

/// A JSON value.
pub type Value = serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// One step of a [`Path`] into a response.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// An index into a list.
    Index(usize),
    /// A key of an object.
    Key(String),
}

/// A path into the `data` of a GraphQL response, as found in `errors[].path`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);
