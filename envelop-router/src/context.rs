//! Per-request context.
//!
//! A [`Context`] is created fresh for every request from the [`TransportInput`] the HTTP layer
//! extracted, mutated by the `on_context_building` hooks in registration order, and then moved into
//! the execution arguments. It is never shared between requests.

use http::HeaderMap;
use http::Method;
use http::Uri;
use http::request::Parts;
use serde::Deserialize;
use serde::Serialize;

/// Transport metadata of the inbound request, as seen by context building hooks.
#[derive(Clone, Debug, Default)]
pub struct TransportInput {
    /// The HTTP method.
    pub method: Method,
    /// The request URI.
    pub uri: Uri,
    /// The request headers.
    pub headers: HeaderMap,
}

impl TransportInput {
    /// Transport input carrying only headers.
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Default::default()
        }
    }
}

impl From<&Parts> for TransportInput {
    fn from(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }
}

/// The identity attached to a request by the authorization plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name of the caller.
    pub name: String,
}

impl Identity {
    /// Creates an identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// State owned by a single in-flight request.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Headers copied from the transport.
    pub headers: HeaderMap,
    /// The caller, if one was recognized.
    pub user: Option<Identity>,
}

impl Context {
    /// The initial context of a request, before any hook ran.
    pub fn new(input: &TransportInput) -> Self {
        Self {
            headers: input.headers.clone(),
            user: None,
        }
    }
}
