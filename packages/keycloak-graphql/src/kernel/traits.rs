// Trait definitions for dependency injection
//
// Infrastructure traits only. The authorization decisions live in common::auth
// and are written against these seams.
//
// Naming convention: Base* for trait names (e.g., BaseGrantManager)

use async_trait::async_trait;

use crate::common::auth::{
    AuthorizationRequest, AuthorizationServiceError, Grant, RequestInfo, TokenError,
};

// =============================================================================
// Grant Manager Trait (validates bearer tokens)
// =============================================================================

#[async_trait]
pub trait BaseGrantManager: Send + Sync {
    /// Validate a raw bearer token and wrap it in a grant
    async fn create_grant(&self, raw_token: &str) -> Result<Grant, TokenError>;
}

// =============================================================================
// Authorization Service Trait (external permission decisions)
// =============================================================================

#[async_trait]
pub trait BaseAuthorizationService: Send + Sync {
    /// Ask the authorization server for a grant covering the requested permissions
    ///
    /// Rejects on denial as well as on transport errors.
    async fn check_permissions(
        &self,
        request: &AuthorizationRequest,
        ambient: &RequestInfo,
    ) -> Result<Grant, AuthorizationServiceError>;
}
