//! The schema and resolvers served by default.

use apollo_compiler::ast::OperationType;
use apollo_compiler::resolvers::FieldError;
use apollo_compiler::resolvers::ObjectValue;
use apollo_compiler::resolvers::ResolveInfo;
use apollo_compiler::resolvers::ResolvedValue;
use chrono::SecondsFormat;
use chrono::Utc;

use crate::context::Context;
use crate::execution::RootResolver;
use crate::json_ext::Value;

/// SDL of the bundled schema.
pub const SCHEMA: &str = r#"type User {
  id: ID!
  name: String!
  email: String!
}

type Message {
  message: String!
  timestamp: String!
}

type Query {
  hello: String!
  users: [User!]!
  user(id: ID!): User
}

type Mutation {
  sendMessage(message: String!): Message!
}
"#;

const GREETING: &str = "Hello from Envelop!";

#[derive(Debug)]
struct User {
    id: &'static str,
    name: &'static str,
    email: &'static str,
}

static USERS: [User; 3] = [
    User {
        id: "1",
        name: "Alice",
        email: "alice@example.com",
    },
    User {
        id: "2",
        name: "Bob",
        email: "bob@example.com",
    },
    User {
        id: "3",
        name: "Carol",
        email: "carol@example.com",
    },
];

#[derive(Clone, Copy, Debug)]
struct UserObject(&'static User);

#[derive(Debug)]
struct Message {
    message: String,
    timestamp: String,
}

/// Static resolvers for the bundled schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemoResolvers;

impl RootResolver for DemoResolvers {
    fn resolve_root_field<'a>(
        &'a self,
        operation_type: OperationType,
        _context: &'a Context,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match (operation_type, info.field_name()) {
            (OperationType::Query, "hello") => Ok(ResolvedValue::leaf(GREETING)),
            (OperationType::Query, "users") => Ok(ResolvedValue::List(Box::new(
                USERS
                    .iter()
                    .map(|user| Ok(ResolvedValue::object(UserObject(user)))),
            ))),
            (OperationType::Query, "user") => {
                let id = match info.arguments().get("id") {
                    Some(Value::String(id)) => id.as_str().to_string(),
                    Some(Value::Number(id)) => id.to_string(),
                    _ => {
                        return Err(FieldError {
                            message: "argument 'id' must be an ID".to_string(),
                        });
                    }
                };
                Ok(match USERS.iter().find(|user| user.id == id) {
                    Some(user) => ResolvedValue::object(UserObject(user)),
                    None => ResolvedValue::null(),
                })
            }
            (OperationType::Mutation, "sendMessage") => {
                let message = info
                    .arguments()
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FieldError {
                        message: "argument 'message' must be a string".to_string(),
                    })?;
                Ok(ResolvedValue::object(Message {
                    message: message.to_string(),
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                }))
            }
            (_, field) => Err(unknown_field(field)),
        }
    }
}

impl ObjectValue for UserObject {
    fn type_name(&self) -> &str {
        "User"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match info.field_name() {
            "id" => Ok(ResolvedValue::leaf(self.0.id)),
            "name" => Ok(ResolvedValue::leaf(self.0.name)),
            "email" => Ok(ResolvedValue::leaf(self.0.email)),
            field => Err(unknown_field(field)),
        }
    }
}

impl ObjectValue for Message {
    fn type_name(&self) -> &str {
        "Message"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        match info.field_name() {
            "message" => Ok(ResolvedValue::leaf(self.message.as_str())),
            "timestamp" => Ok(ResolvedValue::leaf(self.timestamp.as_str())),
            field => Err(unknown_field(field)),
        }
    }
}

fn unknown_field(field: &str) -> FieldError {
    FieldError {
        message: format!("no resolver for field '{field}'"),
    }
}
