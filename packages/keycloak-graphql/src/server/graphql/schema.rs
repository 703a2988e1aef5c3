//! Executable GraphQL schema.
//!
//! juniper types are normally derived at compile time. Here the object types
//! come from a `SchemaDefinition`, so a single `ObjectValue` type is described
//! at runtime through its `ObjectInfo` type info.

use futures::future::{BoxFuture, FutureExt};
use juniper::meta::{Field, MetaType};
use juniper::{
    Arguments, DefaultScalarValue, EmptySubscription, ExecutionResult, Executor, FieldError,
    FieldResult, GraphQLType, GraphQLValue, GraphQLValueAsync, Registry, RootNode, Value, ID,
};
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tracing::debug;

use super::context::GraphQLContext;
use super::definition::{
    ArgumentDefinition, FieldDefinition, ObjectDefinition, ScalarType, SchemaDefinition,
    SchemaError, TypeRef,
};
use super::resolver::{DefaultResolver, FieldResolver, ResolverParams};

/// juniper hides a mutation root with this name from introspection
const EMPTY_MUTATION: &str = "_EmptyMutation";

pub type Schema = RootNode<'static, ObjectValue, ObjectValue, EmptySubscription<GraphQLContext>>;

/// Runtime type info: which object type a value is resolved as
#[derive(Clone)]
pub struct ObjectInfo {
    schema: Arc<SchemaDefinition>,
    name: String,
}

impl ObjectInfo {
    fn new(schema: Arc<SchemaDefinition>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    fn object(&self) -> Option<&ObjectDefinition> {
        self.schema.get(&self.name)
    }

    fn child(&self, name: &str) -> Self {
        Self::new(self.schema.clone(), name)
    }

    fn field(&self, field_name: &str) -> FieldResult<&FieldDefinition> {
        self.schema.field(&self.name, field_name).ok_or_else(|| {
            FieldError::new(
                format!("Unknown field {}.{}", self.name, field_name),
                Value::null(),
            )
        })
    }
}

/// A JSON value resolved as a GraphQL object
#[derive(Debug, Clone)]
pub struct ObjectValue(pub Json);

impl GraphQLType for ObjectValue {
    fn name(info: &ObjectInfo) -> Option<&str> {
        Some(&info.name)
    }

    fn meta<'r>(info: &ObjectInfo, registry: &mut Registry<'r>) -> MetaType<'r>
    where
        DefaultScalarValue: 'r,
    {
        let mut fields = Vec::new();
        let mut description = None;

        if let Some(object) = info.object() {
            description = object.description.clone();
            for definition in object.fields.values() {
                fields.push(field_meta(info, definition, registry));
            }
        }

        let mut meta = registry.build_object_type::<ObjectValue>(info, &fields);
        if let Some(description) = description {
            meta = meta.description(description.as_str());
        }
        meta.into_meta()
    }
}

fn field_meta<'r>(
    info: &ObjectInfo,
    definition: &FieldDefinition,
    registry: &mut Registry<'r>,
) -> Field<'r, DefaultScalarValue> {
    let name = definition.name.as_str();
    let mut field = match &definition.ty {
        TypeRef::Scalar(ScalarType::Boolean) => registry.field::<Option<bool>>(name, &()),
        TypeRef::Scalar(ScalarType::Int) => registry.field::<Option<i32>>(name, &()),
        TypeRef::Scalar(ScalarType::Float) => registry.field::<Option<f64>>(name, &()),
        TypeRef::Scalar(ScalarType::String) => registry.field::<Option<String>>(name, &()),
        TypeRef::Scalar(ScalarType::Id) => registry.field::<Option<ID>>(name, &()),
        TypeRef::List(ScalarType::Boolean) => {
            registry.field::<Option<Vec<Option<bool>>>>(name, &())
        }
        TypeRef::List(ScalarType::Int) => registry.field::<Option<Vec<Option<i32>>>>(name, &()),
        TypeRef::List(ScalarType::Float) => {
            registry.field::<Option<Vec<Option<f64>>>>(name, &())
        }
        TypeRef::List(ScalarType::String) => {
            registry.field::<Option<Vec<Option<String>>>>(name, &())
        }
        TypeRef::List(ScalarType::Id) => registry.field::<Option<Vec<Option<ID>>>>(name, &()),
        TypeRef::Object(target) => {
            registry.field::<Option<ObjectValue>>(name, &info.child(target))
        }
        TypeRef::ObjectList(target) => {
            registry.field::<Option<Vec<Option<ObjectValue>>>>(name, &info.child(target))
        }
    };

    for argument in &definition.arguments {
        let arg_name = argument.name.as_str();
        let arg = match argument.ty {
            ScalarType::Boolean => registry.arg::<Option<bool>>(arg_name, &()),
            ScalarType::Int => registry.arg::<Option<i32>>(arg_name, &()),
            ScalarType::Float => registry.arg::<Option<f64>>(arg_name, &()),
            ScalarType::String => registry.arg::<Option<String>>(arg_name, &()),
            ScalarType::Id => registry.arg::<Option<ID>>(arg_name, &()),
        };
        field = field.argument(arg);
    }

    if let Some(description) = &definition.description {
        field = field.description(description.as_str());
    }

    field
}

impl GraphQLValue for ObjectValue {
    type Context = GraphQLContext;
    type TypeInfo = ObjectInfo;

    fn type_name<'i>(&self, info: &'i ObjectInfo) -> Option<&'i str> {
        Some(&info.name)
    }
}

impl GraphQLValueAsync for ObjectValue {
    fn resolve_field_async<'a>(
        &'a self,
        info: &'a ObjectInfo,
        field_name: &'a str,
        arguments: &'a Arguments,
        executor: &'a Executor<GraphQLContext>,
    ) -> BoxFuture<'a, ExecutionResult> {
        async move {
            let field = info.field(field_name)?;
            let params = ResolverParams {
                parent: self.0.clone(),
                args: read_arguments(&field.arguments, arguments)?,
                context: executor.context().clone(),
                type_name: info.name.clone(),
                field_name: field_name.to_string(),
            };

            let resolved = match &field.resolver {
                Some(resolver) => resolver.resolve(params).await?,
                None => DefaultResolver.resolve(params).await?,
            };

            match &field.ty {
                TypeRef::Scalar(scalar) => scalar_value(*scalar, &resolved, field_name),
                TypeRef::List(scalar) => match resolved {
                    Json::Null => Ok(Value::null()),
                    Json::Array(items) => items
                        .iter()
                        .map(|item| scalar_value(*scalar, item, field_name))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::list),
                    other => Err(type_mismatch(field_name, "a list", &other)),
                },
                TypeRef::Object(target) => match resolved {
                    Json::Null => Ok(Value::null()),
                    value @ Json::Object(_) => {
                        executor
                            .resolve_async(&info.child(target), &ObjectValue(value))
                            .await
                    }
                    other => Err(type_mismatch(field_name, "an object", &other)),
                },
                TypeRef::ObjectList(target) => match resolved {
                    Json::Null => Ok(Value::null()),
                    Json::Array(items) => {
                        let objects: Vec<Option<ObjectValue>> = items
                            .into_iter()
                            .map(|item| (!item.is_null()).then(|| ObjectValue(item)))
                            .collect();
                        executor.resolve_async(&info.child(target), &objects).await
                    }
                    other => Err(type_mismatch(field_name, "a list", &other)),
                },
            }
        }
        .boxed()
    }
}

/// Collect declared arguments, applying defaults
fn read_arguments(
    definitions: &[ArgumentDefinition],
    arguments: &Arguments,
) -> FieldResult<Map<String, Json>> {
    let mut args = Map::new();

    for definition in definitions {
        let name = definition.name.as_str();
        let value = match definition.ty {
            ScalarType::Boolean => arguments.get::<Option<bool>>(name)?.flatten().map(Json::from),
            ScalarType::Int => arguments.get::<Option<i32>>(name)?.flatten().map(Json::from),
            ScalarType::Float => arguments.get::<Option<f64>>(name)?.flatten().map(Json::from),
            ScalarType::String => arguments.get::<Option<String>>(name)?.flatten().map(Json::from),
            ScalarType::Id => arguments
                .get::<Option<ID>>(name)?
                .flatten()
                .map(|id| Json::String(id.to_string())),
        };

        let value = value
            .or_else(|| definition.default.clone())
            .unwrap_or(Json::Null);
        args.insert(definition.name.clone(), value);
    }

    Ok(args)
}

fn scalar_value(scalar: ScalarType, value: &Json, field_name: &str) -> ExecutionResult {
    if value.is_null() {
        return Ok(Value::null());
    }

    let converted = match scalar {
        ScalarType::Boolean => value.as_bool().map(Value::scalar),
        ScalarType::Int => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::scalar),
        ScalarType::Float => value.as_f64().map(Value::scalar),
        ScalarType::String => value.as_str().map(|s| Value::scalar(s.to_string())),
        ScalarType::Id => match value {
            Json::String(s) => Some(Value::scalar(s.clone())),
            Json::Number(n) => Some(Value::scalar(n.to_string())),
            _ => None,
        },
    };

    converted.ok_or_else(|| type_mismatch(field_name, &scalar.to_string(), value))
}

fn type_mismatch(field_name: &str, expected: &str, value: &Json) -> FieldError {
    FieldError::new(
        format!("Field {} expected {}, resolver returned {}", field_name, expected, value),
        Value::null(),
    )
}

/// Build an executable schema from a (transformed) definition
///
/// The root value of both query and mutation is an empty object.
pub fn build_schema(definition: SchemaDefinition) -> Result<Schema, SchemaError> {
    definition.validate()?;

    debug!(
        types = definition.objects.len(),
        query = %definition.query,
        "Building GraphQL schema"
    );

    let query = definition.query.clone();
    let mutation = definition
        .mutation
        .clone()
        .unwrap_or_else(|| EMPTY_MUTATION.to_string());
    let definition = Arc::new(definition);

    Ok(Schema::new_with_info(
        ObjectValue(Json::Object(Map::new())),
        ObjectValue(Json::Object(Map::new())),
        EmptySubscription::new(),
        ObjectInfo::new(definition.clone(), query),
        ObjectInfo::new(definition, mutation),
        (),
    ))
}
