//! Schema fixtures and call-counting resolvers.

use keycloak_graphql::server::graphql::{
    resolve_fn, DirectiveUsage, FieldDefinition, ObjectDefinition, Resolver, ScalarType,
    SchemaDefinition, TypeRef,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts how often a resolver ran
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolver returning `value` and recording each invocation
pub fn counting_resolver(value: Value) -> (Resolver, CallCounter) {
    let counter = CallCounter::default();
    let calls = counter.0.clone();

    let resolver = resolve_fn(move |_| {
        let calls = calls.clone();
        let value = value.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    });

    (resolver, counter)
}

/// `Query { hello: String <directives>, public: String }`
///
/// `hello` resolves to "world" through a counting resolver; `public` is
/// unguarded.
pub fn hello_schema(directives: Vec<DirectiveUsage>) -> (SchemaDefinition, CallCounter) {
    let (resolver, counter) = counting_resolver(json!("world"));

    let mut hello = FieldDefinition::new("hello", TypeRef::Scalar(ScalarType::String))
        .resolver(resolver);
    for directive in directives {
        hello = hello.directive(directive);
    }

    let definition = SchemaDefinition::new().object(
        ObjectDefinition::new("Query")
            .field(hello)
            .field(
                FieldDefinition::new("public", TypeRef::Scalar(ScalarType::String))
                    .resolver(resolve_fn(|_| async { Ok(json!("open")) })),
            ),
    );

    (definition, counter)
}

pub fn auth() -> DirectiveUsage {
    DirectiveUsage::new("auth")
}

pub fn has_role(role: Value) -> DirectiveUsage {
    DirectiveUsage::new("hasRole").argument("role", role)
}

pub fn has_permission(resources: Value) -> DirectiveUsage {
    DirectiveUsage::new("hasPermission").argument("resources", resources)
}
