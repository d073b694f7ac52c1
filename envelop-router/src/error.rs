//! Pipeline errors.
use apollo_compiler::validation::DiagnosticList;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

use crate::graphql;
use crate::graphql::Response;

pub(crate) const PARSING_FAILED_CODE: &str = "GRAPHQL_PARSING_FAILED";
pub(crate) const VALIDATION_FAILED_CODE: &str = "GRAPHQL_VALIDATION_FAILED";

/// Everything that can terminate a request before (or instead of) producing an execution result.
///
/// Every variant is turned into the `{errors: [...]}` shape at the outer boundary, see
/// [`PipelineError::to_response`]. Resolver failures are not part of this taxonomy: they are
/// reported by the executor next to partial data.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineError {
    /// Must provide query string.
    MissingQuery,

    /// GraphQL parsing failed
    Parse(Vec<graphql::Error>),

    /// failed to build the request context in plugin '{plugin}': {reason}
    ContextBuild {
        /// The plugin whose hook failed.
        plugin: String,
        /// What went wrong.
        reason: String,
    },

    /// GraphQL validation failed
    Validation(Vec<graphql::Error>),

    /// validation aborted by plugin '{plugin}': {reason}
    ValidationAborted {
        /// The plugin that stopped the validation.
        plugin: String,
        /// Why it was stopped.
        reason: String,
    },

    /// Unauthorized
    Unauthorized,

    /// execution aborted by plugin '{plugin}': {reason}
    ExecutionAborted {
        /// The plugin that stopped the execution.
        plugin: String,
        /// Why it was stopped.
        reason: String,
    },

    /// {0} operations are not supported
    UnsupportedOperation(String),
}

impl PipelineError {
    /// A context building failure attributed to `plugin`.
    pub fn context_build(plugin: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::ContextBuild {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    /// A before-execution abort attributed to `plugin`.
    pub fn aborted(plugin: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::ExecutionAborted {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    /// A before-validation abort attributed to `plugin`.
    pub fn validation_aborted(plugin: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::ValidationAborted {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    /// The code exposed in the `extensions` of the error, if any.
    pub fn extension_code(&self) -> Option<&'static str> {
        match self {
            PipelineError::MissingQuery => Some("MISSING_QUERY"),
            PipelineError::Parse(_) => Some(PARSING_FAILED_CODE),
            PipelineError::ContextBuild { .. } => Some("CONTEXT_BUILD_FAILED"),
            PipelineError::Validation(_) => Some(VALIDATION_FAILED_CODE),
            PipelineError::ValidationAborted { .. } => Some("VALIDATION_ABORTED"),
            // the message is the whole contract for unauthenticated callers
            PipelineError::Unauthorized => None,
            PipelineError::ExecutionAborted { .. } => Some("EXECUTION_ABORTED"),
            PipelineError::UnsupportedOperation(_) => Some("OPERATION_NOT_SUPPORTED"),
        }
    }

    /// Convert the pipeline error to GraphQL errors.
    pub fn to_graphql_errors(&self) -> Vec<graphql::Error> {
        match self {
            PipelineError::Parse(errors) | PipelineError::Validation(errors) => errors.clone(),
            _ => vec![
                graphql::Error::builder()
                    .message(self.to_string())
                    .and_extension_code(self.extension_code().map(str::to_string))
                    .build(),
            ],
        }
    }

    /// Convert the error to an appropriate response.
    pub fn to_response(&self) -> Response {
        Response::builder().errors(self.to_graphql_errors()).build()
    }

    /// The HTTP status the request adapter answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::MissingQuery
            | PipelineError::Parse(_)
            | PipelineError::Validation(_)
            | PipelineError::UnsupportedOperation(_) => StatusCode::BAD_REQUEST,
            PipelineError::Unauthorized => StatusCode::UNAUTHORIZED,
            PipelineError::ContextBuild { .. }
            | PipelineError::ValidationAborted { .. }
            | PipelineError::ExecutionAborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ParseErrors> for PipelineError {
    fn from(errors: ParseErrors) -> Self {
        PipelineError::Parse(errors.to_graphql_errors(PARSING_FAILED_CODE))
    }
}

// An after-hook failed. Logged, never returned to the caller.
/// instrumentation hook of plugin '{plugin}' failed: {reason}
#[derive(Error, Display, Debug)]
pub(crate) struct InstrumentationError {
    pub(crate) plugin: &'static str,
    pub(crate) reason: String,
}

/// Error in the schema.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum SchemaError {
    /// GraphQL parser error: {0}
    Parse(ParseErrors),
    /// GraphQL validation error: {0}
    Validate(ParseErrors),
}

/// Collection of GraphQL diagnostics produced by `apollo-compiler`.
#[derive(Debug)]
pub struct ParseErrors {
    pub(crate) errors: DiagnosticList,
}

impl ParseErrors {
    pub(crate) fn to_graphql_errors(&self, code: &str) -> Vec<graphql::Error> {
        self.errors
            .iter()
            .map(|diagnostic| graphql::Error::from_compiler_error(diagnostic.to_json(), code))
            .collect()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut errors = self.errors.iter();
        for (i, error) in errors.by_ref().take(5).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", error)?;
        }
        let remaining = errors.count();
        if remaining > 0 {
            write!(f, "\n...and {remaining} other errors")?;
        }
        Ok(())
    }
}
