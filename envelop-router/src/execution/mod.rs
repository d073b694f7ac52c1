//! Execution of validated documents.
//!
//! The execution algorithm itself is `apollo-compiler`'s. This module assembles its inputs from
//! [`ExecutionArgs`] and packages its output as a [`graphql::Response`].

use std::fmt;
use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::ast::OperationType;
use apollo_compiler::resolvers::Execution;
use apollo_compiler::resolvers::FieldError;
use apollo_compiler::resolvers::ObjectValue;
use apollo_compiler::resolvers::ResolveInfo;
use apollo_compiler::resolvers::ResolvedValue;
use apollo_compiler::validation::Valid;

use crate::context::Context;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::Schema;

/// Label used in observations when the request did not name its operation.
pub(crate) const ANONYMOUS_OPERATION: &str = "anonymous";

/// Resolves the fields of the root operation types.
///
/// Nested objects are resolved by whatever [`ObjectValue`] the root fields return.
pub trait RootResolver: Send + Sync + 'static {
    /// Resolves one field of the root type of `operation_type`.
    fn resolve_root_field<'a>(
        &'a self,
        operation_type: OperationType,
        context: &'a Context,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError>;
}

/// Everything the execute phase needs. Built once per request, after validation.
pub struct ExecutionArgs {
    /// The schema.
    pub schema: Arc<Schema>,
    /// The validated document.
    pub document: Arc<Valid<ExecutableDocument>>,
    /// The root resolvers.
    pub root: Arc<dyn RootResolver>,
    /// Raw variable values, coerced by the executor.
    pub variables: Object,
    /// The operation to run, required when the document has several.
    pub operation_name: Option<String>,
    /// The request context.
    pub context: Context,
}

impl ExecutionArgs {
    /// The operation name, or `"anonymous"`.
    pub fn operation_label(&self) -> &str {
        self.operation_name
            .as_deref()
            .unwrap_or(ANONYMOUS_OPERATION)
    }

    /// The type of the selected operation, if the document has one matching the name.
    pub fn operation_type(&self) -> Option<OperationType> {
        self.document
            .operations
            .get(self.operation_name.as_deref())
            .ok()
            .map(|operation| operation.operation_type)
    }
}

impl fmt::Debug for ExecutionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionArgs")
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Runs the selected operation.
///
/// Request errors (unknown operation, bad variables) and field errors are both reported in the
/// response, the latter next to partial data.
pub(crate) fn execute(args: &ExecutionArgs) -> graphql::Response {
    let document = &args.document;
    let operation = match document.operations.get(args.operation_name.as_deref()) {
        Ok(operation) => operation,
        Err(e) => {
            return graphql::Response::builder()
                .error(graphql::Error::from(
                    e.to_graphql_error(&document.sources),
                ))
                .build();
        }
    };
    let root_type = args
        .schema
        .definitions()
        .root_operation(operation.operation_type)
        .map(|name| name.as_str())
        .unwrap_or_default();
    let initial_value = OperationRoot {
        type_name: root_type,
        operation_type: operation.operation_type,
        resolver: args.root.as_ref(),
        context: &args.context,
    };
    let result = Execution::new(args.schema.definitions(), document)
        .operation(operation)
        .raw_variable_values(&args.variables)
        .execute_sync(&initial_value);
    match result {
        Ok(response) => graphql::Response::builder()
            .data(Value::from(response.data))
            .errors(response.errors.into_iter().map(Into::into).collect())
            .build(),
        Err(request_error) => graphql::Response::builder()
            .error(graphql::Error::from(
                request_error.to_graphql_error(&document.sources),
            ))
            .build(),
    }
}

struct OperationRoot<'a> {
    type_name: &'a str,
    operation_type: OperationType,
    resolver: &'a dyn RootResolver,
    context: &'a Context,
}

impl ObjectValue for OperationRoot<'_> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        self.resolver
            .resolve_root_field(self.operation_type, self.context, info)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serde_json_bytes::json as bjson;

    use super::*;
    use crate::demo::DemoResolvers;
    use crate::plugin::ValidationOutcome;
    use crate::spec::ParsedDocument;

    fn args(query: &str, operation_name: Option<&str>, variables: serde_json_bytes::Value) -> ExecutionArgs {
        let schema = Arc::new(Schema::parse(crate::demo::SCHEMA).unwrap());
        let parsed = ParsedDocument::parse(query, 100).unwrap();
        let document = ValidationOutcome::validate(&schema, &parsed)
            .into_result()
            .unwrap();
        ExecutionArgs {
            schema,
            document,
            root: Arc::new(DemoResolvers),
            variables: variables.as_object().cloned().unwrap_or_default(),
            operation_name: operation_name.map(str::to_string),
            context: Context::default(),
        }
    }

    #[test]
    fn executes_a_query() {
        let response = execute(&args("{ hello }", None, bjson!({})));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "data": { "hello": "Hello from Envelop!" } })
        );
    }

    #[test]
    fn coerces_variables() {
        let response = execute(&args(
            "query aTest($id: ID!) { user(id: $id) { name email } }",
            Some("aTest"),
            bjson!({ "id": "3" }),
        ));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "data": { "user": { "name": "Carol", "email": "carol@example.com" } } })
        );
    }

    #[test]
    fn missing_variable_is_a_request_error() {
        let response = execute(&args(
            "query aTest($id: ID!) { user(id: $id) { name } }",
            None,
            bjson!({}),
        ));
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn unknown_operation_name_is_a_request_error() {
        let execution_args = args("query A { hello } query B { hello }", Some("C"), bjson!({}));
        assert_eq!(execution_args.operation_type(), None);
        let response = execute(&execution_args);
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn operation_label_falls_back_to_anonymous() {
        let named = args("query Greeting { hello }", Some("Greeting"), bjson!({}));
        assert_eq!(named.operation_label(), "Greeting");
        assert_eq!(named.operation_type(), Some(OperationType::Query));
        let anonymous = args("{ hello }", None, bjson!({}));
        assert_eq!(anonymous.operation_label(), ANONYMOUS_OPERATION);
    }
}
