//! Connection handshake for long-lived (subscription) connections.
//!
//! The client sends `{"Authorization": "Bearer <token>"}` as its connection
//! parameters. The token is validated once and the resulting capabilities are
//! held for the lifetime of the connection.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::auth::{
    parse_bearer, AccessToken, AuthorizationConfig, ConnectionContext, HandshakeError,
    RequestInfo, TokenError,
};
use crate::kernel::{BaseAuthorizationService, BaseGrantManager};
use crate::server::graphql::GraphQLContext;

const AUTHORIZATION_PARAM: &str = "Authorization";

pub struct SubscriptionHandler {
    grant_manager: Arc<dyn BaseGrantManager>,
    protect: bool,
    authorization: Option<(Arc<dyn BaseAuthorizationService>, AuthorizationConfig)>,
}

impl SubscriptionHandler {
    /// Protected handler: connections without valid credentials are rejected
    pub fn new(grant_manager: Arc<dyn BaseGrantManager>) -> Self {
        Self {
            grant_manager,
            protect: true,
            authorization: None,
        }
    }

    /// With `protect` off, bad or missing credentials yield an
    /// unauthenticated connection instead of a rejection
    pub fn protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    /// Enable delegated permission checks on accepted connections
    pub fn with_authorization(
        mut self,
        service: Arc<dyn BaseAuthorizationService>,
        config: AuthorizationConfig,
    ) -> Self {
        self.authorization = Some((service, config));
        self
    }

    pub fn is_protected(&self) -> bool {
        self.protect
    }

    /// Validate the connection parameters
    ///
    /// Returns the caller's token, or `None` for an unauthenticated connection
    /// accepted because the handler is not protected.
    pub async fn on_subscription_connect(
        &self,
        connection_params: &Value,
    ) -> Result<Option<Arc<dyn AccessToken>>, HandshakeError> {
        match self.authenticate(connection_params).await {
            Ok(token) => {
                debug!("Connection authenticated");
                Ok(Some(token))
            }
            Err(err) if !self.protect => {
                debug!(error = %err, "Accepting unauthenticated connection");
                Ok(None)
            }
            Err(err) => {
                info!(error = %err, "Connection rejected");
                Err(err)
            }
        }
    }

    /// Validate the connection parameters and build the connection's capabilities
    pub async fn on_connect(
        &self,
        connection_params: &Value,
    ) -> Result<ConnectionContext, HandshakeError> {
        let token = self.on_subscription_connect(connection_params).await?;

        let handshake = authorization_param(connection_params)
            .map(RequestInfo::with_authorization)
            .unwrap_or_default();

        let mut context = ConnectionContext::new(token).with_handshake(handshake);
        if let Some((service, config)) = &self.authorization {
            context = context.with_authorization(service.clone(), config.clone());
        }

        Ok(context)
    }

    /// GraphQL context for operations executed on this connection
    pub async fn graphql_context(
        &self,
        connection_params: &Value,
    ) -> Result<GraphQLContext, HandshakeError> {
        self.on_connect(connection_params)
            .await
            .map(GraphQLContext::from_connection)
    }

    async fn authenticate(
        &self,
        connection_params: &Value,
    ) -> Result<Arc<dyn AccessToken>, HandshakeError> {
        if !connection_params.is_object() {
            return Err(HandshakeError::MissingConnectionParams);
        }

        let authorization =
            authorization_param(connection_params).ok_or(HandshakeError::MissingAuthorization)?;
        let raw_token = parse_bearer(authorization).ok_or(HandshakeError::MalformedAuthorization)?;

        let grant = self.grant_manager.create_grant(raw_token).await?;
        grant.access_token().cloned().ok_or_else(|| {
            HandshakeError::GrantFailed(TokenError::Malformed(
                "grant carries no access token".to_string(),
            ))
        })
    }
}

fn authorization_param(connection_params: &Value) -> Option<&str> {
    connection_params
        .get(AUTHORIZATION_PARAM)
        .and_then(Value::as_str)
}
