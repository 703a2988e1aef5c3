// Main entry point for the GraphQL server

use std::sync::Arc;

use anyhow::{Context, Result};
use keycloak_graphql::common::auth::AuthorizationConfig;
use keycloak_graphql::domains::directives::apply_directive_transformers;
use keycloak_graphql::kernel::{KeycloakAuthorizationClient, KeycloakGrantManager};
use keycloak_graphql::server::demo::demo_schema_definition;
use keycloak_graphql::server::{build_app, build_schema, AxumAppState};
use keycloak_graphql::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keycloak_graphql=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Keycloak GraphQL server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        realm = %config.keycloak_realm,
        client_id = %config.keycloak_client_id,
        "Configuration loaded"
    );

    let options = config.keycloak_options();
    let grant_manager = Arc::new(
        KeycloakGrantManager::new(&options).context("Failed to load token verification key")?,
    );
    let authorization = Arc::new(KeycloakAuthorizationClient::new(
        &options,
        grant_manager.clone(),
    ));

    // Directive errors are programmer errors: refuse to start
    let definition = apply_directive_transformers(demo_schema_definition())
        .context("Invalid authorization directives")?;
    let schema = build_schema(definition).context("Failed to build GraphQL schema")?;

    let state = AxumAppState::new(grant_manager).with_authorization(
        authorization,
        AuthorizationConfig::new(config.resource_server_id.clone()),
    );
    let app = build_app(schema, state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("GraphQL endpoint: http://localhost:{}/graphql", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
