use base64::Engine;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{AccessToken, RequestInfo};
use crate::kernel::BaseAuthorizationService;

/// Separator between resource, resource id and scope in a permission string
pub const PERMISSION_DELIMITER: char = ':';

/// Maps the current request to extra claims pushed to the authorization server
pub type ClaimsFn = Arc<dyn Fn(&RequestInfo) -> Option<serde_json::Value> + Send + Sync>;

/// Settings for delegated permission checks
#[derive(Clone, Default)]
pub struct AuthorizationConfig {
    /// Audience of the delegated authorization request
    pub resource_server_id: Option<String>,
    pub claims: Option<ClaimsFn>,
}

impl AuthorizationConfig {
    pub fn new(resource_server_id: impl Into<String>) -> Self {
        Self {
            resource_server_id: Some(resource_server_id.into()),
            claims: None,
        }
    }

    pub fn with_claims<F>(mut self, claims: F) -> Self
    where
        F: Fn(&RequestInfo) -> Option<serde_json::Value> + Send + Sync + 'static,
    {
        self.claims = Some(Arc::new(claims));
        self
    }
}

impl fmt::Debug for AuthorizationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationConfig")
            .field("resource_server_id", &self.resource_server_id)
            .field("claims", &self.claims.is_some())
            .finish()
    }
}

/// One parsed `resource[:id][:scope]` requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePermission {
    pub resource: String,
    pub scope: Option<String>,
}

impl ResourcePermission {
    /// `Article` is a bare resource, `Article:view` carries a scope and
    /// `Article:123456:read` keeps the id on the resource (`Article:123456`).
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once(PERMISSION_DELIMITER) {
            None => Self {
                resource: raw.to_string(),
                scope: None,
            },
            Some((resource, scope)) => Self {
                resource: resource.to_string(),
                scope: (!scope.is_empty()).then(|| scope.to_string()),
            },
        }
    }

    fn is_granted_by(&self, token: &dyn AccessToken) -> bool {
        token.has_permission(&self.resource, self.scope.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub resource_id: String,
    pub resource_scopes: Vec<String>,
}

/// Query sent to the authorization server on the fallback path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub permissions: Vec<PermissionRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_server_id: Option<String>,
    /// Base64 encoded JSON claims
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_token: Option<String>,
}

/// Decides resource/scope requirements for one caller
///
/// The caller's own token is consulted first. Only when it falls short is the
/// authorization server asked, once, for a grant covering the full list.
#[derive(Clone, Default)]
pub struct PermissionsHandler {
    token: Option<Arc<dyn AccessToken>>,
    service: Option<Arc<dyn BaseAuthorizationService>>,
    config: AuthorizationConfig,
    request: RequestInfo,
}

impl PermissionsHandler {
    pub fn new(token: Option<Arc<dyn AccessToken>>) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    pub fn with_service(
        mut self,
        service: Arc<dyn BaseAuthorizationService>,
        config: AuthorizationConfig,
    ) -> Self {
        self.service = Some(service);
        self.config = config;
        self
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = request;
        self
    }

    pub async fn has_permission(&self, resources: &[String]) -> bool {
        if resources.is_empty() {
            return true;
        }

        let Some(token) = &self.token else {
            debug!("Permission check without an access token");
            return false;
        };

        let required: Vec<ResourcePermission> = resources
            .iter()
            .map(|raw| ResourcePermission::parse(raw))
            .collect();

        if required.iter().all(|p| p.is_granted_by(token.as_ref())) {
            return true;
        }

        let Some(service) = &self.service else {
            debug!(?resources, "Permission denied by token, no authorization service");
            return false;
        };

        let request = self.authorization_request(&required);
        match service.check_permissions(&request, &self.request).await {
            Ok(grant) => match grant.access_token() {
                Some(granted) => required.iter().all(|p| p.is_granted_by(granted.as_ref())),
                None => false,
            },
            Err(e) => {
                debug!(error = %e, ?resources, "Authorization server denied permissions");
                false
            }
        }
    }

    /// Build the fallback query for the given requirements
    pub fn authorization_request(&self, required: &[ResourcePermission]) -> AuthorizationRequest {
        let permissions = required
            .iter()
            .map(|p| PermissionRequest {
                resource_id: p.resource.clone(),
                resource_scopes: p.scope.iter().cloned().collect(),
            })
            .collect();

        let claim_token = self
            .config
            .claims
            .as_ref()
            .and_then(|claims| claims(&self.request))
            .map(|claims| {
                base64::engine::general_purpose::STANDARD.encode(claims.to_string())
            });

        AuthorizationRequest {
            permissions,
            resource_server_id: self.config.resource_server_id.clone(),
            claim_token,
        }
    }
}
