use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::{AccessToken, AuthorizationConfig, Grant, PermissionsHandler, RequestInfo};
use crate::kernel::BaseAuthorizationService;

/// What the field guards may ask about the current caller
///
/// Implementations are read-only views over an immutable token handle.
/// `has_permission` resolves to `false` on any decision failure.
#[async_trait]
pub trait CapabilityContext: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn has_role(&self, role: &str) -> bool;

    async fn has_permission(&self, resources: &[String]) -> bool;
}

/// The well-known capability slot of a resolution context
///
/// `None` means the caller is not authenticated.
pub trait HasCapabilities {
    fn capabilities(&self) -> Option<&dyn CapabilityContext>;
}

/// Token-backed capabilities shared by request and connection contexts
#[derive(Clone, Default)]
pub struct ContextBase {
    access_token: Option<Arc<dyn AccessToken>>,
    permissions: PermissionsHandler,
}

impl ContextBase {
    pub fn new(access_token: Option<Arc<dyn AccessToken>>) -> Self {
        Self {
            permissions: PermissionsHandler::new(access_token.clone()),
            access_token,
        }
    }

    pub fn access_token(&self) -> Option<&Arc<dyn AccessToken>> {
        self.access_token.as_ref()
    }

    fn with_permissions(mut self, permissions: PermissionsHandler) -> Self {
        self.permissions = permissions;
        self
    }
}

impl fmt::Debug for ContextBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBase")
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CapabilityContext for ContextBase {
    fn is_authenticated(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|token| !token.is_expired())
    }

    fn has_role(&self, role: &str) -> bool {
        match &self.access_token {
            Some(token) if !token.is_expired() => token.has_role(role),
            _ => false,
        }
    }

    async fn has_permission(&self, resources: &[String]) -> bool {
        self.permissions.has_permission(resources).await
    }
}

/// Capabilities of a single inbound request
///
/// Reads the grant the bearer middleware attached to the request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    base: ContextBase,
    request: RequestInfo,
}

impl RequestContext {
    pub fn new(grant: Option<&Grant>, request: RequestInfo) -> Self {
        let access_token = grant.and_then(|g| g.access_token().cloned());
        let base = ContextBase::new(access_token.clone())
            .with_permissions(PermissionsHandler::new(access_token).with_request(request.clone()));
        Self { base, request }
    }

    /// Build directly from a token, independent of any transport
    pub fn from_token(access_token: Arc<dyn AccessToken>) -> Self {
        Self::new(Some(&Grant::new(access_token)), RequestInfo::default())
    }

    /// Enable the delegated permission fallback for this request
    pub fn with_authorization(
        mut self,
        service: Arc<dyn BaseAuthorizationService>,
        config: AuthorizationConfig,
    ) -> Self {
        let permissions = PermissionsHandler::new(self.base.access_token.clone())
            .with_request(self.request.clone())
            .with_service(service, config);
        self.base = self.base.with_permissions(permissions);
        self
    }

    pub fn access_token(&self) -> Option<&Arc<dyn AccessToken>> {
        self.base.access_token()
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }
}

#[async_trait]
impl CapabilityContext for RequestContext {
    fn is_authenticated(&self) -> bool {
        self.base.is_authenticated()
    }

    fn has_role(&self, role: &str) -> bool {
        self.base.has_role(role)
    }

    async fn has_permission(&self, resources: &[String]) -> bool {
        self.base.has_permission(resources).await
    }
}

/// Capabilities of a long-lived connection, fixed at handshake time
#[derive(Debug, Clone, Default)]
pub struct ConnectionContext {
    base: ContextBase,
    handshake: RequestInfo,
}

impl ConnectionContext {
    pub fn new(access_token: Option<Arc<dyn AccessToken>>) -> Self {
        Self {
            base: ContextBase::new(access_token),
            handshake: RequestInfo::default(),
        }
    }

    /// Keep the handshake's request data for delegated checks
    pub fn with_handshake(mut self, handshake: RequestInfo) -> Self {
        self.handshake = handshake;
        let permissions = PermissionsHandler::new(self.base.access_token.clone())
            .with_request(self.handshake.clone());
        self.base = self.base.with_permissions(permissions);
        self
    }

    /// Enable the delegated permission fallback for this connection
    pub fn with_authorization(
        mut self,
        service: Arc<dyn BaseAuthorizationService>,
        config: AuthorizationConfig,
    ) -> Self {
        let permissions = PermissionsHandler::new(self.base.access_token.clone())
            .with_request(self.handshake.clone())
            .with_service(service, config);
        self.base = self.base.with_permissions(permissions);
        self
    }

    pub fn access_token(&self) -> Option<&Arc<dyn AccessToken>> {
        self.base.access_token()
    }
}

#[async_trait]
impl CapabilityContext for ConnectionContext {
    fn is_authenticated(&self) -> bool {
        self.base.is_authenticated()
    }

    fn has_role(&self, role: &str) -> bool {
        self.base.has_role(role)
    }

    async fn has_permission(&self, resources: &[String]) -> bool {
        self.base.has_permission(resources).await
    }
}
