//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::common::auth::{AuthorizationConfig, Grant, RequestContext, RequestInfo};
use crate::kernel::{BaseAuthorizationService, BaseGrantManager};
use crate::server::graphql::{GraphQLContext, Schema};
use crate::server::middleware::bearer_auth_middleware;
use crate::server::routes::{
    graphql_batch_handler, graphql_handler, graphql_playground, health_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub grant_manager: Arc<dyn BaseGrantManager>,
    /// Delegated permission checks; local token checks only when `None`
    pub authorization: Option<(Arc<dyn BaseAuthorizationService>, AuthorizationConfig)>,
}

impl AxumAppState {
    pub fn new(grant_manager: Arc<dyn BaseGrantManager>) -> Self {
        Self {
            grant_manager,
            authorization: None,
        }
    }

    pub fn with_authorization(
        mut self,
        service: Arc<dyn BaseAuthorizationService>,
        config: AuthorizationConfig,
    ) -> Self {
        self.authorization = Some((service, config));
        self
    }
}

/// Middleware to create GraphQLContext per-request
async fn create_graphql_context(
    Extension(state): Extension<AxumAppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    // Grant is populated by bearer_auth_middleware
    let grant = parts.extensions.get::<Grant>().cloned();
    let mut capabilities = RequestContext::new(grant.as_ref(), RequestInfo::from_parts(&parts));
    if let Some((service, config)) = &state.authorization {
        capabilities = capabilities.with_authorization(service.clone(), config.clone());
    }

    let mut request = Request::from_parts(parts, body);
    request
        .extensions_mut()
        .insert(GraphQLContext::from_request(capabilities));

    next.run(request).await
}

/// Build the Axum application router
pub fn build_app(schema: Schema, state: AxumAppState) -> Router {
    let schema = Arc::new(schema);

    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let grant_manager = state.grant_manager.clone();

    let mut router = Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/batch", post(graphql_batch_handler));

    // GraphQL playground only in debug builds (development)
    #[cfg(debug_assertions)]
    {
        router = router.route("/graphql", get(graphql_playground));
    }

    router
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(create_graphql_context))
        .layer(middleware::from_fn(move |req, next| {
            bearer_auth_middleware(grant_manager.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(schema)
}
