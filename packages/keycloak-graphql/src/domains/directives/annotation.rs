use serde_json::Value;

use crate::server::graphql::{DirectiveUsage, SchemaError};

const ROLE_ARGUMENT: &str = "role";
const RESOURCES_ARGUMENT: &str = "resources";

/// Names under which the authorization directives appear in a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNames {
    pub auth: String,
    pub has_role: String,
    pub has_permission: String,
}

impl Default for DirectiveNames {
    fn default() -> Self {
        Self {
            auth: "auth".to_string(),
            has_role: "hasRole".to_string(),
            has_permission: "hasPermission".to_string(),
        }
    }
}

impl DirectiveNames {
    /// SDL declarations of the three directives
    pub fn type_defs(&self) -> String {
        format!(
            "directive @{} on FIELD_DEFINITION\n\
             directive @{}({}: [String]) on FIELD_DEFINITION\n\
             directive @{}({}: [String]) on FIELD_DEFINITION\n",
            self.auth,
            self.has_role,
            ROLE_ARGUMENT,
            self.has_permission,
            RESOURCES_ARGUMENT
        )
    }

    /// Classify a directive usage, validating its arguments
    pub fn classify(&self, usage: &DirectiveUsage) -> Result<Annotation, SchemaError> {
        if usage.name == self.auth {
            if !usage.arguments.is_empty() {
                return Err(SchemaError::ArgumentsNotAllowed {
                    directive: usage.name.clone(),
                });
            }
            Ok(Annotation::Auth)
        } else if usage.name == self.has_role {
            string_list_argument(usage, ROLE_ARGUMENT).map(Annotation::HasRole)
        } else if usage.name == self.has_permission {
            string_list_argument(usage, RESOURCES_ARGUMENT).map(Annotation::HasPermission)
        } else {
            Ok(Annotation::None)
        }
    }
}

/// What a directive asks of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Not an authorization directive
    None,
    Auth,
    HasRole(Vec<String>),
    HasPermission(Vec<String>),
}

/// The single `expected` argument, as a string or list of strings
fn string_list_argument(
    usage: &DirectiveUsage,
    expected: &'static str,
) -> Result<Vec<String>, SchemaError> {
    let value = match usage.arguments.get(expected) {
        Some(value) if usage.arguments.len() == 1 => value,
        _ => {
            return Err(SchemaError::UnexpectedArguments {
                directive: usage.name.clone(),
                expected,
            })
        }
    };

    let invalid = || SchemaError::InvalidArgumentValue {
        directive: usage.name.clone(),
        argument: expected,
    };

    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}
