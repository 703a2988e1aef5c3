// TestDependencies - mock implementations for testing
//
// Call-recording doubles for the capability context and the infrastructure
// traits, injected wherever the real Keycloak-backed types would be.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{BaseAuthorizationService, BaseGrantManager};
use crate::common::auth::{
    AccessToken, AuthorizationRequest, AuthorizationServiceError, CapabilityContext, Grant,
    RequestInfo, TokenError,
};

// =============================================================================
// Mock Access Token
// =============================================================================

/// Token with a fixed set of roles and resource/scope pairs
///
/// `None` for roles or permissions means "grants everything".
#[derive(Debug, Clone, Default)]
pub struct MockAccessToken {
    expired: bool,
    roles: Option<Vec<String>>,
    permissions: Option<Vec<(String, Option<String>)>>,
}

impl MockAccessToken {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny_all() -> Self {
        Self {
            expired: false,
            roles: Some(Vec::new()),
            permissions: Some(Vec::new()),
        }
    }

    pub fn with_roles(roles: &[&str]) -> Self {
        Self {
            roles: Some(roles.iter().map(|r| r.to_string()).collect()),
            permissions: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn with_permissions(permissions: &[(&str, Option<&str>)]) -> Self {
        Self {
            roles: Some(Vec::new()),
            permissions: Some(
                permissions
                    .iter()
                    .map(|(resource, scope)| (resource.to_string(), scope.map(str::to_string)))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn expired(mut self) -> Self {
        self.expired = true;
        self
    }
}

impl AccessToken for MockAccessToken {
    fn is_expired(&self) -> bool {
        self.expired
    }

    fn has_role(&self, role: &str) -> bool {
        match &self.roles {
            Some(roles) => roles.iter().any(|r| r == role),
            None => true,
        }
    }

    fn has_permission(&self, resource: &str, scope: Option<&str>) -> bool {
        match &self.permissions {
            Some(permissions) => permissions
                .iter()
                .any(|(r, s)| r == resource && s.as_deref() == scope),
            None => true,
        }
    }
}

// =============================================================================
// Mock Capability Context
// =============================================================================

type PermissionCheck = Arc<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Capability context that records every question it is asked
pub struct MockCapabilities {
    authenticated: bool,
    roles: Vec<String>,
    permission_check: PermissionCheck,
    authentication_calls: Arc<Mutex<usize>>,
    role_calls: Arc<Mutex<Vec<String>>>,
    permission_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockCapabilities {
    fn new(authenticated: bool) -> Self {
        Self {
            authenticated,
            roles: Vec::new(),
            permission_check: Arc::new(|_| false),
            authentication_calls: Arc::new(Mutex::new(0)),
            role_calls: Arc::new(Mutex::new(Vec::new())),
            permission_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn authenticated() -> Self {
        Self::new(true)
    }

    pub fn unauthenticated() -> Self {
        Self::new(false)
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Fixed answer for every permission check
    pub fn with_permission(self, granted: bool) -> Self {
        self.with_permission_check(move |_| granted)
    }

    pub fn with_permission_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.permission_check = Arc::new(check);
        self
    }

    pub fn authentication_calls(&self) -> usize {
        *self.authentication_calls.lock().unwrap()
    }

    /// Roles probed so far, in call order
    pub fn role_calls(&self) -> Vec<String> {
        self.role_calls.lock().unwrap().clone()
    }

    /// Resource lists passed to `has_permission`, in call order
    pub fn permission_calls(&self) -> Vec<Vec<String>> {
        self.permission_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityContext for MockCapabilities {
    fn is_authenticated(&self) -> bool {
        *self.authentication_calls.lock().unwrap() += 1;
        self.authenticated
    }

    fn has_role(&self, role: &str) -> bool {
        self.role_calls.lock().unwrap().push(role.to_string());
        self.roles.iter().any(|r| r == role)
    }

    async fn has_permission(&self, resources: &[String]) -> bool {
        self.permission_calls.lock().unwrap().push(resources.to_vec());
        (self.permission_check)(resources)
    }
}

// =============================================================================
// Mock Authorization Service
// =============================================================================

pub struct MockAuthorizationService {
    response: Option<Grant>,
    calls: Arc<Mutex<Vec<AuthorizationRequest>>>,
    ambient: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockAuthorizationService {
    /// Answers every request with the given grant
    pub fn returning(grant: Grant) -> Self {
        Self {
            response: Some(grant),
            calls: Arc::new(Mutex::new(Vec::new())),
            ambient: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every request with a grant wrapping `token`
    pub fn granting(token: MockAccessToken) -> Self {
        Self::returning(Grant::new(Arc::new(token)))
    }

    /// Rejects every request
    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            ambient: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<AuthorizationRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Authorization header of the ambient request for each call
    pub fn ambient_authorizations(&self) -> Vec<Option<String>> {
        self.ambient.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseAuthorizationService for MockAuthorizationService {
    async fn check_permissions(
        &self,
        request: &AuthorizationRequest,
        ambient: &RequestInfo,
    ) -> Result<Grant, AuthorizationServiceError> {
        self.calls.lock().unwrap().push(request.clone());
        self.ambient
            .lock()
            .unwrap()
            .push(ambient.authorization().map(str::to_string));

        self.response
            .clone()
            .ok_or_else(|| AuthorizationServiceError::Denied("mock denial".to_string()))
    }
}

// =============================================================================
// Mock Grant Manager
// =============================================================================

pub struct MockGrantManager {
    token: Option<MockAccessToken>,
    error: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGrantManager {
    /// Accepts any raw token and grants `token`
    pub fn accepting(token: MockAccessToken) -> Self {
        Self {
            token: Some(token),
            error: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn rejecting(error: &str) -> Self {
        Self {
            token: None,
            error: error.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Raw tokens passed to `create_grant`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseGrantManager for MockGrantManager {
    async fn create_grant(&self, raw_token: &str) -> Result<Grant, TokenError> {
        self.calls.lock().unwrap().push(raw_token.to_string());
        match &self.token {
            Some(token) => Ok(Grant::new(Arc::new(token.clone()))),
            None => Err(TokenError::Malformed(self.error.clone())),
        }
    }
}
