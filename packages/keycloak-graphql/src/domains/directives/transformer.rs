use std::sync::Arc;
use tracing::debug;

use super::annotation::DirectiveNames;
use super::guard::{FieldRequirements, Guard, GuardedResolver};
use crate::server::graphql::{
    DefaultResolver, FieldDefinition, Resolver, SchemaDefinition, SchemaError,
};

/// Rewrites annotated fields so their resolvers run behind a guard
///
/// Fields without authorization directives keep their resolver untouched.
#[derive(Debug, Clone, Default)]
pub struct DirectiveTransformer {
    names: DirectiveNames,
}

impl DirectiveTransformer {
    pub fn new(names: DirectiveNames) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &DirectiveNames {
        &self.names
    }

    pub fn transform(
        &self,
        mut definition: SchemaDefinition,
    ) -> Result<SchemaDefinition, SchemaError> {
        let mut guarded = 0usize;

        for object in definition.objects.values_mut() {
            let type_name = &object.name;
            for field in object.fields.values_mut() {
                let requirements = self.requirements(type_name, field)?;
                let Some(guard) = Guard::from_requirements(requirements) else {
                    continue;
                };

                debug!(
                    type_name = %type_name,
                    field = %field.name,
                    checks = ?guard.checks(),
                    "Guarding field"
                );

                let inner: Resolver = field
                    .resolver
                    .take()
                    .unwrap_or_else(|| Arc::new(DefaultResolver));
                field.resolver = Some(Arc::new(GuardedResolver::new(guard, inner)));
                guarded += 1;
            }
        }

        debug!(guarded, "Applied authorization directives");
        Ok(definition)
    }

    fn requirements(
        &self,
        type_name: &str,
        field: &FieldDefinition,
    ) -> Result<FieldRequirements, SchemaError> {
        let mut requirements = FieldRequirements::default();

        for usage in &field.directives {
            let annotation = self.names.classify(usage)?;
            if !requirements.record(annotation) {
                return Err(SchemaError::RepeatedDirective {
                    directive: usage.name.clone(),
                    type_name: type_name.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(requirements)
    }
}

/// Apply the authorization directives under their default names
pub fn apply_directive_transformers(
    definition: SchemaDefinition,
) -> Result<SchemaDefinition, SchemaError> {
    DirectiveTransformer::default().transform(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockCapabilities;
    use crate::server::graphql::{
        resolve_fn, DirectiveUsage, GraphQLContext, ObjectDefinition, ResolverParams,
        ScalarType, TypeRef,
    };
    use serde_json::{json, Map, Value};

    fn string() -> TypeRef {
        TypeRef::Scalar(ScalarType::String)
    }

    fn definition(field: FieldDefinition) -> SchemaDefinition {
        SchemaDefinition::new().object(
            ObjectDefinition::new("Query")
                .field(field)
                .field(FieldDefinition::new("public", string())),
        )
    }

    fn params(context: GraphQLContext) -> ResolverParams {
        ResolverParams {
            parent: json!({ "secret": "from parent" }),
            args: Map::new(),
            context,
            type_name: "Query".to_string(),
            field_name: "secret".to_string(),
        }
    }

    #[test]
    fn test_unannotated_fields_keep_resolver_identity() {
        let resolver = resolve_fn(|_| async { Ok(json!("plain")) });
        let def = definition(FieldDefinition::new("secret", string()).resolver(resolver.clone()));

        let transformed = apply_directive_transformers(def).unwrap();

        let kept = transformed.field("Query", "secret").unwrap().resolver.as_ref().unwrap();
        assert!(Arc::ptr_eq(kept, &resolver));
        assert!(transformed.field("Query", "public").unwrap().resolver.is_none());
    }

    #[test]
    fn test_unknown_directives_are_ignored() {
        let def = definition(
            FieldDefinition::new("secret", string())
                .directive(DirectiveUsage::new("deprecated").argument("reason", json!("old"))),
        );
        let transformed = apply_directive_transformers(def).unwrap();
        assert!(transformed.field("Query", "secret").unwrap().resolver.is_none());
    }

    #[test]
    fn test_annotated_field_gets_resolver() {
        let def = definition(
            FieldDefinition::new("secret", string()).directive(DirectiveUsage::new("auth")),
        );
        let transformed = apply_directive_transformers(def).unwrap();
        assert!(transformed.field("Query", "secret").unwrap().resolver.is_some());
    }

    #[tokio::test]
    async fn test_default_resolver_behind_guard() {
        let def = definition(
            FieldDefinition::new("secret", string()).directive(DirectiveUsage::new("auth")),
        );
        let transformed = apply_directive_transformers(def).unwrap();
        let resolver = transformed
            .field("Query", "secret")
            .unwrap()
            .resolver
            .clone()
            .unwrap();

        let capabilities = Arc::new(MockCapabilities::authenticated());
        let context = GraphQLContext::with_capabilities(capabilities);
        assert_eq!(
            resolver.resolve(params(context)).await.unwrap(),
            json!("from parent")
        );

        let err = resolver
            .resolve(params(GraphQLContext::default()))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "User not authenticated");
    }

    #[tokio::test]
    async fn test_combined_directives_share_one_guard() {
        let def = definition(
            FieldDefinition::new("secret", string())
                .directive(
                    DirectiveUsage::new("hasPermission").argument("resources", json!("Article")),
                )
                .directive(DirectiveUsage::new("auth"))
                .directive(DirectiveUsage::new("hasRole").argument("role", json!("admin")))
                .resolver(resolve_fn(|_| async { Ok(Value::from("ok")) })),
        );
        let transformed = apply_directive_transformers(def).unwrap();
        let resolver = transformed
            .field("Query", "secret")
            .unwrap()
            .resolver
            .clone()
            .unwrap();

        let capabilities = Arc::new(MockCapabilities::authenticated().with_permission(true));
        let context = GraphQLContext::with_capabilities(capabilities.clone());
        let err = resolver.resolve(params(context)).await.unwrap_err();

        assert_eq!(
            err.message(),
            "User is not authorized. Must have one of the following roles: [admin]"
        );
        assert!(capabilities.permission_calls().is_empty());
    }

    #[test]
    fn test_custom_directive_names() {
        let transformer = DirectiveTransformer::new(DirectiveNames {
            auth: "authenticated".to_string(),
            ..Default::default()
        });
        let def = definition(
            FieldDefinition::new("secret", string())
                .directive(DirectiveUsage::new("authenticated")),
        );
        let transformed = transformer.transform(def).unwrap();
        assert!(transformed.field("Query", "secret").unwrap().resolver.is_some());
    }

    #[test]
    fn test_invalid_arguments_fail_the_build() {
        let def = definition(
            FieldDefinition::new("secret", string())
                .directive(
                    DirectiveUsage::new("hasPermission").argument("resource", json!("Article")),
                ),
        );
        let err = apply_directive_transformers(def).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnexpectedArguments {
                directive: "hasPermission".to_string(),
                expected: "resources",
            }
        );
    }

    #[test]
    fn test_repeated_directive_fails_the_build() {
        let def = definition(
            FieldDefinition::new("secret", string())
                .directive(DirectiveUsage::new("hasRole").argument("role", json!("admin")))
                .directive(DirectiveUsage::new("hasRole").argument("role", json!("staff"))),
        );
        let err = apply_directive_transformers(def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "directive @hasRole is repeated on field Query.secret"
        );
    }
}
