//! Schema definition model.
//!
//! Object types, their fields and the directive usages attached to them.
//! The directive transformer rewrites a definition; `build_schema` turns the
//! result into an executable juniper schema.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use super::resolver::Resolver;

/// Construction-time schema errors
///
/// These are programmer errors. They stop the schema from being built and
/// never reach request handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid {directive} args. must contain only a \"{expected}\" argument")]
    UnexpectedArguments {
        directive: String,
        expected: &'static str,
    },

    #[error("invalid {directive} args. {argument} must be a String or an Array of Strings")]
    InvalidArgumentValue {
        directive: String,
        argument: &'static str,
    },

    #[error("invalid {directive} args. {directive} does not take arguments")]
    ArgumentsNotAllowed { directive: String },

    #[error("directive @{directive} is repeated on field {type_name}.{field}")]
    RepeatedDirective {
        directive: String,
        type_name: String,
        field: String,
    },

    #[error("unknown type {type_name} referenced by {referenced_by}")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("type {0} has no fields")]
    EmptyType(String),
}

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Boolean,
    Int,
    Float,
    String,
    Id,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Boolean => "Boolean",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::String => "String",
            ScalarType::Id => "ID",
        };
        f.write_str(name)
    }
}

/// Output type of a field
///
/// Every output is nullable so that a failed guard only nulls its own field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarType),
    List(ScalarType),
    Object(String),
    ObjectList(String),
}

impl TypeRef {
    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    pub fn object_list(name: impl Into<String>) -> Self {
        TypeRef::ObjectList(name.into())
    }

    /// Name of the referenced object type, if any
    pub fn object_name(&self) -> Option<&str> {
        match self {
            TypeRef::Object(name) | TypeRef::ObjectList(name) => Some(name),
            TypeRef::Scalar(_) | TypeRef::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    pub name: String,
    pub ty: ScalarType,
    pub default: Option<Value>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A directive applied to a field, e.g. `@hasRole(role: ["admin"])`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveUsage {
    pub name: String,
    pub arguments: IndexMap<String, Value>,
}

impl DirectiveUsage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

#[derive(Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: Vec<ArgumentDefinition>,
    pub directives: Vec<DirectiveUsage>,
    /// `None` resolves the identically named property of the parent value
    pub resolver: Option<Resolver>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: Vec::new(),
            directives: Vec::new(),
            resolver: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn directive(mut self, directive: DirectiveUsage) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("arguments", &self.arguments)
            .field("directives", &self.directives)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
}

impl ObjectDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// A complete schema: object types plus the names of the root types
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub query: String,
    pub mutation: Option<String>,
    pub objects: IndexMap<String, ObjectDefinition>,
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDefinition {
    /// Empty schema whose query root is `Query`
    pub fn new() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: None,
            objects: IndexMap::new(),
        }
    }

    pub fn object(mut self, object: ObjectDefinition) -> Self {
        self.objects.insert(object.name.clone(), object);
        self
    }

    pub fn mutation(mut self, name: impl Into<String>) -> Self {
        self.mutation = Some(name.into());
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&ObjectDefinition> {
        self.objects.get(type_name)
    }

    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldDefinition> {
        self.get(type_name).and_then(|object| object.fields.get(field))
    }

    /// Check names, root types and type references
    pub fn validate(&self) -> Result<(), SchemaError> {
        let roots = std::iter::once(&self.query).chain(self.mutation.iter());
        for root in roots {
            if !self.objects.contains_key(root) {
                return Err(SchemaError::UnknownType {
                    type_name: root.clone(),
                    referenced_by: "schema".to_string(),
                });
            }
        }

        for object in self.objects.values() {
            check_name(&object.name)?;
            if object.fields.is_empty() {
                return Err(SchemaError::EmptyType(object.name.clone()));
            }

            for field in object.fields.values() {
                check_name(&field.name)?;
                for argument in &field.arguments {
                    check_name(&argument.name)?;
                }

                if let Some(target) = field.ty.object_name() {
                    if !self.objects.contains_key(target) {
                        return Err(SchemaError::UnknownType {
                            type_name: target.to_string(),
                            referenced_by: format!("{}.{}", object.name, field.name),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// GraphQL names: `[_A-Za-z][_0-9A-Za-z]*`, not starting with `__`
fn check_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    let valid_rest = chars.all(|c| c == '_' || c.is_ascii_alphanumeric());

    if valid_start && valid_rest && !name.starts_with("__") {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaDefinition {
        SchemaDefinition::new()
            .object(
                ObjectDefinition::new("Query")
                    .field(FieldDefinition::new("article", TypeRef::object("Article"))),
            )
            .object(
                ObjectDefinition::new("Article")
                    .field(FieldDefinition::new("title", TypeRef::Scalar(ScalarType::String))),
            )
    }

    #[test]
    fn test_valid_schema() {
        assert_eq!(schema().validate(), Ok(()));
    }

    #[test]
    fn test_missing_query_root() {
        let def = SchemaDefinition::new().object(
            ObjectDefinition::new("Article")
                .field(FieldDefinition::new("title", TypeRef::Scalar(ScalarType::String))),
        );
        assert!(matches!(
            def.validate(),
            Err(SchemaError::UnknownType { type_name, .. }) if type_name == "Query"
        ));
    }

    #[test]
    fn test_missing_mutation_root() {
        let def = schema().mutation("Mutation");
        assert!(matches!(
            def.validate(),
            Err(SchemaError::UnknownType { type_name, .. }) if type_name == "Mutation"
        ));
    }

    #[test]
    fn test_unknown_field_type() {
        let def = schema().object(
            ObjectDefinition::new("Query")
                .field(FieldDefinition::new("comments", TypeRef::object_list("Comment"))),
        );
        assert_eq!(
            def.validate(),
            Err(SchemaError::UnknownType {
                type_name: "Comment".to_string(),
                referenced_by: "Query.comments".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1st", "with-dash", "__reserved"] {
            let def = SchemaDefinition::new().object(
                ObjectDefinition::new("Query")
                    .field(FieldDefinition::new(name, TypeRef::Scalar(ScalarType::Int))),
            );
            assert_eq!(def.validate(), Err(SchemaError::InvalidName(name.to_string())));
        }
    }

    #[test]
    fn test_empty_type() {
        let def = schema().object(ObjectDefinition::new("Empty"));
        assert_eq!(def.validate(), Err(SchemaError::EmptyType("Empty".to_string())));
    }

    #[test]
    fn test_builders_preserve_order() {
        let field = FieldDefinition::new("articles", TypeRef::object_list("Article"))
            .argument(ArgumentDefinition::new("first", ScalarType::Int).with_default(json!(10)))
            .directive(DirectiveUsage::new("auth"))
            .directive(DirectiveUsage::new("hasRole").argument("role", json!("admin")));

        assert_eq!(field.arguments[0].default, Some(json!(10)));
        let names: Vec<_> = field.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["auth", "hasRole"]);
    }

    #[test]
    fn test_error_messages() {
        let err = SchemaError::UnexpectedArguments {
            directive: "hasRole".to_string(),
            expected: "role",
        };
        assert_eq!(
            err.to_string(),
            "invalid hasRole args. must contain only a \"role\" argument"
        );

        let err = SchemaError::InvalidArgumentValue {
            directive: "hasPermission".to_string(),
            argument: "resources",
        };
        assert_eq!(
            err.to_string(),
            "invalid hasPermission args. resources must be a String or an Array of Strings"
        );
    }
}
