//! Field resolvers.

use async_trait::async_trait;
use juniper::FieldResult;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

use super::context::GraphQLContext;

/// Everything a field resolver receives
#[derive(Clone)]
pub struct ResolverParams {
    /// Value of the object that owns the field
    pub parent: Value,
    /// Declared arguments, defaults applied, `null` when absent
    pub args: Map<String, Value>,
    pub context: GraphQLContext,
    pub type_name: String,
    pub field_name: String,
}

#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, params: ResolverParams) -> FieldResult<Value>;
}

pub type Resolver = Arc<dyn FieldResolver>;

/// Returns the identically named property of the parent value
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

#[async_trait]
impl FieldResolver for DefaultResolver {
    async fn resolve(&self, params: ResolverParams) -> FieldResult<Value> {
        Ok(params
            .parent
            .get(&params.field_name)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

struct FnResolver<F>(F);

#[async_trait]
impl<F, Fut> FieldResolver for FnResolver<F>
where
    F: Fn(ResolverParams) -> Fut + Send + Sync,
    Fut: Future<Output = FieldResult<Value>> + Send,
{
    async fn resolve(&self, params: ResolverParams) -> FieldResult<Value> {
        (self.0)(params).await
    }
}

/// Wrap an async closure as a resolver
///
/// ```rust,ignore
/// let hello = resolve_fn(|params| async move {
///     Ok(serde_json::json!(format!("hello {}", params.args["name"])))
/// });
/// ```
pub fn resolve_fn<F, Fut>(f: F) -> Resolver
where
    F: Fn(ResolverParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FieldResult<Value>> + Send + 'static,
{
    Arc::new(FnResolver(f))
}
