use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The caller's access token as seen by the authorization layer
///
/// Implementations must be read-only: checks never mutate the token.
pub trait AccessToken: Send + Sync {
    /// True once the token's expiry has passed
    fn is_expired(&self) -> bool;

    /// Native role check of the token
    fn has_role(&self, role: &str) -> bool;

    /// Native resource/scope check of the token
    fn has_permission(&self, resource: &str, scope: Option<&str>) -> bool;
}

impl fmt::Debug for dyn AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("expired", &self.is_expired())
            .finish_non_exhaustive()
    }
}

/// A bundle issued by the identity provider around an access token
#[derive(Clone, Default)]
pub struct Grant {
    pub access_token: Option<Arc<dyn AccessToken>>,
}

impl Grant {
    pub fn new(access_token: Arc<dyn AccessToken>) -> Self {
        Self {
            access_token: Some(access_token),
        }
    }

    pub fn access_token(&self) -> Option<&Arc<dyn AccessToken>> {
        self.access_token.as_ref()
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grant")
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A single resource permission granted inside a token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantedPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsname: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationClaims {
    #[serde(default)]
    pub permissions: Vec<GrantedPermission>,
}

/// Decoded payload of a Keycloak access token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RoleSet>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub resource_access: HashMap<String, RoleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationClaims>,
}

/// Keycloak access token
#[derive(Clone)]
pub struct Token {
    raw: String,
    client_id: Option<String>,
    content: TokenContent,
}

impl Token {
    pub fn new(raw: impl Into<String>, client_id: Option<String>, content: TokenContent) -> Self {
        Self {
            raw: raw.into(),
            client_id,
            content,
        }
    }

    /// The encoded token as received from the caller
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn content(&self) -> &TokenContent {
        &self.content
    }

    pub fn has_realm_role(&self, role: &str) -> bool {
        self.content
            .realm_access
            .as_ref()
            .is_some_and(|access| access.roles.iter().any(|r| r == role))
    }

    pub fn has_application_role(&self, app: &str, role: &str) -> bool {
        self.content
            .resource_access
            .get(app)
            .is_some_and(|access| access.roles.iter().any(|r| r == role))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("client_id", &self.client_id)
            .field("subject", &self.content.sub)
            .field("expired", &self.is_expired())
            .finish_non_exhaustive()
    }
}

impl AccessToken for Token {
    fn is_expired(&self) -> bool {
        match self.content.exp {
            Some(exp) => exp < chrono::Utc::now().timestamp(),
            None => false,
        }
    }

    /// `realm:<role>` checks realm roles, `<app>:<role>` checks that client's
    /// roles and a bare `<role>` checks this token's own client.
    fn has_role(&self, role: &str) -> bool {
        match role.split_once(':') {
            Some(("realm", realm_role)) => self.has_realm_role(realm_role),
            Some((app, app_role)) => self.has_application_role(app, app_role),
            None => match &self.client_id {
                Some(client_id) => self.has_application_role(client_id, role),
                None => false,
            },
        }
    }

    fn has_permission(&self, resource: &str, scope: Option<&str>) -> bool {
        let Some(authorization) = &self.content.authorization else {
            return false;
        };

        let matching = authorization.permissions.iter().find(|permission| {
            permission.rsid.as_deref() == Some(resource)
                || permission.rsname.as_deref() == Some(resource)
        });

        match (matching, scope) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(permission), Some(scope)) => {
                permission.scopes.is_empty() || permission.scopes.iter().any(|s| s == scope)
            }
        }
    }
}
