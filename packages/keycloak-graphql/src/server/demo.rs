//! Sample schema served by the `server` binary.

use serde_json::{json, Value};

use crate::server::graphql::{
    resolve_fn, ArgumentDefinition, DirectiveUsage, FieldDefinition, ObjectDefinition,
    ResolverParams, ScalarType, SchemaDefinition, TypeRef,
};

fn articles() -> Value {
    json!([
        { "id": "1", "title": "Getting started", "body": "Hello", "views": 42 },
        { "id": "2", "title": "Field guards", "body": "Directives at work", "views": 7 },
    ])
}

fn view_permission() -> DirectiveUsage {
    DirectiveUsage::new("hasPermission").argument("resources", json!("Article:view"))
}

/// Articles behind the three authorization directives
pub fn demo_schema_definition() -> SchemaDefinition {
    let article = ObjectDefinition::new("Article")
        .field(FieldDefinition::new("id", TypeRef::Scalar(ScalarType::Id)))
        .field(FieldDefinition::new("title", TypeRef::Scalar(ScalarType::String)))
        .field(FieldDefinition::new("body", TypeRef::Scalar(ScalarType::String)))
        .field(
            FieldDefinition::new("views", TypeRef::Scalar(ScalarType::Int))
                .directive(DirectiveUsage::new("hasRole").argument("role", json!("editor"))),
        );

    let query = ObjectDefinition::new("Query")
        .field(
            FieldDefinition::new("hello", TypeRef::Scalar(ScalarType::String))
                .description("Public greeting")
                .resolver(resolve_fn(|_| async { Ok(json!("Hello world!")) })),
        )
        .field(
            FieldDefinition::new("greeting", TypeRef::Scalar(ScalarType::String))
                .description("Greeting for signed-in users")
                .directive(DirectiveUsage::new("auth"))
                .resolver(resolve_fn(|_| async { Ok(json!("Welcome back!")) })),
        )
        .field(
            FieldDefinition::new("articles", TypeRef::object_list("Article"))
                .directive(view_permission())
                .resolver(resolve_fn(|_| async { Ok(articles()) })),
        )
        .field(
            FieldDefinition::new("article", TypeRef::object("Article"))
                .argument(ArgumentDefinition::new("id", ScalarType::Id))
                .directive(view_permission())
                .resolver(resolve_fn(|params: ResolverParams| async move {
                    let found = articles()
                        .as_array()
                        .and_then(|all| {
                            all.iter()
                                .find(|article| params.args.get("id") == Some(&article["id"]))
                                .cloned()
                        })
                        .unwrap_or(Value::Null);
                    Ok(found)
                })),
        );

    let mutation = ObjectDefinition::new("Mutation").field(
        FieldDefinition::new("publishArticle", TypeRef::object("Article"))
            .argument(ArgumentDefinition::new("title", ScalarType::String))
            .directive(DirectiveUsage::new("hasRole").argument("role", json!(["editor", "admin"])))
            .directive(
                DirectiveUsage::new("hasPermission")
                    .argument("resources", json!(["Article:create", "Article:publish"])),
            )
            .resolver(resolve_fn(|params: ResolverParams| async move {
                Ok(json!({
                    "id": "3",
                    "title": params.args.get("title"),
                    "body": "",
                    "views": 0,
                }))
            })),
    );

    SchemaDefinition::new()
        .object(query)
        .object(mutation)
        .object(article)
        .mutation("Mutation")
}
