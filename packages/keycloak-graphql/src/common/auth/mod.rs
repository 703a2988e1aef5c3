/// Authorization primitives for guarded GraphQL fields
///
/// A transport (HTTP request or subscription handshake) yields a capability
/// context. Field guards then ask it questions:
///
/// ```rust,ignore
/// use keycloak_graphql::common::auth::{CapabilityContext, RequestContext};
///
/// let context = RequestContext::new(Some(&grant), request_info)
///     .with_authorization(authorization_service, config);
///
/// if context.is_authenticated() && context.has_permission(&resources).await {
///     // resolve the field
/// }
/// ```

mod capability;
mod errors;
mod permissions;
mod request;
mod roles;
mod token;

pub use capability::{
    CapabilityContext, ConnectionContext, ContextBase, HasCapabilities, RequestContext,
};
pub use errors::{AuthError, AuthorizationServiceError, HandshakeError, TokenError};
pub use permissions::{
    AuthorizationConfig, AuthorizationRequest, ClaimsFn, PermissionRequest, PermissionsHandler,
    ResourcePermission, PERMISSION_DELIMITER,
};
pub use request::{parse_bearer, RequestInfo};
pub use roles::is_authorized_by_role;
pub use token::{
    AccessToken, AuthorizationClaims, Grant, GrantedPermission, RoleSet, Token, TokenContent,
};
