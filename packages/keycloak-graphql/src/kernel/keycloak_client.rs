//! Keycloak-backed grant manager and authorization client.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BaseAuthorizationService, BaseGrantManager};
use crate::common::auth::{
    AuthorizationRequest, AuthorizationServiceError, Grant, RequestInfo, Token, TokenContent,
    TokenError,
};

const UMA_TICKET_GRANT: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";
const JWT_CLAIM_TOKEN_FORMAT: &str = "urn:ietf:params:oauth:token-type:jwt";

/// Key used to verify access token signatures
#[derive(Debug, Clone)]
pub enum VerificationKey {
    /// Realm public key, PEM encoded (RS256)
    RsaPem(String),
    /// Shared client secret (HS256)
    Secret(String),
}

/// Where the realm lives and who we are inside it
#[derive(Debug, Clone)]
pub struct KeycloakOptions {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub verification: VerificationKey,
}

impl KeycloakOptions {
    pub fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.url.trim_end_matches('/'), self.realm)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.realm_url())
    }
}

/// Verifies bearer tokens locally against the realm key
pub struct KeycloakGrantManager {
    client_id: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl KeycloakGrantManager {
    pub fn new(options: &KeycloakOptions) -> Result<Self, TokenError> {
        let (decoding_key, algorithm) = match &options.verification {
            VerificationKey::RsaPem(pem) => {
                (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256)
            }
            VerificationKey::Secret(secret) => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[options.realm_url()]);
        // Keycloak puts the resource servers in `aud`, not the token's client
        validation.validate_aud = false;

        Ok(Self {
            client_id: options.client_id.clone(),
            decoding_key,
            validation,
        })
    }

    /// Verify and decode a raw access token
    pub fn verify_token(&self, raw_token: &str) -> Result<Token, TokenError> {
        let data = decode::<TokenContent>(raw_token, &self.decoding_key, &self.validation)?;
        Ok(Token::new(
            raw_token,
            Some(self.client_id.clone()),
            data.claims,
        ))
    }
}

#[async_trait]
impl BaseGrantManager for KeycloakGrantManager {
    async fn create_grant(&self, raw_token: &str) -> Result<Grant, TokenError> {
        let token = self.verify_token(raw_token)?;
        Ok(Grant::new(Arc::new(token)))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Asks the realm's token endpoint for UMA grants on behalf of the caller
pub struct KeycloakAuthorizationClient {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    grant_manager: Arc<dyn BaseGrantManager>,
}

impl KeycloakAuthorizationClient {
    pub fn new(options: &KeycloakOptions, grant_manager: Arc<dyn BaseGrantManager>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_endpoint: options.token_endpoint(),
            client_id: options.client_id.clone(),
            grant_manager,
        }
    }

    /// Form body of the UMA ticket grant request
    pub fn uma_ticket_form(&self, request: &AuthorizationRequest) -> Vec<(&'static str, String)> {
        let audience = request
            .resource_server_id
            .clone()
            .unwrap_or_else(|| self.client_id.clone());

        let mut form = vec![
            ("grant_type", UMA_TICKET_GRANT.to_string()),
            ("audience", audience),
        ];

        for permission in &request.permissions {
            let value = if permission.resource_scopes.is_empty() {
                permission.resource_id.clone()
            } else {
                format!(
                    "{}#{}",
                    permission.resource_id,
                    permission.resource_scopes.join(",")
                )
            };
            form.push(("permission", value));
        }

        if let Some(claim_token) = &request.claim_token {
            form.push(("claim_token", claim_token.clone()));
            form.push(("claim_token_format", JWT_CLAIM_TOKEN_FORMAT.to_string()));
        }

        form
    }
}

#[async_trait]
impl BaseAuthorizationService for KeycloakAuthorizationClient {
    async fn check_permissions(
        &self,
        request: &AuthorizationRequest,
        ambient: &RequestInfo,
    ) -> Result<Grant, AuthorizationServiceError> {
        let bearer = ambient.bearer_token().ok_or_else(|| {
            AuthorizationServiceError::Denied("no bearer token on the request".to_string())
        })?;

        debug!(
            endpoint = %self.token_endpoint,
            permissions = request.permissions.len(),
            "Requesting UMA grant"
        );

        let response = self
            .http
            .post(&self.token_endpoint)
            .bearer_auth(bearer)
            .form(&self.uma_ticket_form(request))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthorizationServiceError::Denied(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Authorization server error");
            return Err(AuthorizationServiceError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(self.grant_manager.create_grant(&token.access_token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::auth::{PermissionRequest, RoleSet};
    use crate::kernel::test_dependencies::{MockAccessToken, MockGrantManager};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::collections::HashMap;

    fn options() -> KeycloakOptions {
        KeycloakOptions {
            url: "http://localhost:8080/".to_string(),
            realm: "voyager-testing".to_string(),
            client_id: "voyager-testing".to_string(),
            verification: VerificationKey::Secret("test_secret_key".to_string()),
        }
    }

    fn sign(content: &TokenContent, secret: &str) -> String {
        encode(
            &Header::default(),
            content,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_content() -> TokenContent {
        let mut resource_access = HashMap::new();
        resource_access.insert(
            "voyager-testing".to_string(),
            RoleSet {
                roles: vec!["tester".to_string()],
            },
        );
        TokenContent {
            exp: Some(chrono::Utc::now().timestamp() + 3600),
            iss: Some("http://localhost:8080/realms/voyager-testing".to_string()),
            sub: Some("3f804b5a-3e76-4c26-98e6-455d3e353ff7".to_string()),
            resource_access,
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoints() {
        let options = options();
        assert_eq!(
            options.realm_url(),
            "http://localhost:8080/realms/voyager-testing"
        );
        assert_eq!(
            options.token_endpoint(),
            "http://localhost:8080/realms/voyager-testing/protocol/openid-connect/token"
        );
    }

    #[tokio::test]
    async fn test_grant_from_valid_token() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        let raw = sign(&valid_content(), "test_secret_key");

        let grant = manager.create_grant(&raw).await.unwrap();
        let token = grant.access_token().unwrap();
        assert!(!token.is_expired());
        assert!(token.has_role("tester"));
    }

    #[test]
    fn test_verified_token_keeps_raw_value() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        let raw = sign(&valid_content(), "test_secret_key");

        let token = manager.verify_token(&raw).unwrap();
        assert_eq!(token.raw(), raw);
        assert_eq!(token.client_id(), Some("voyager-testing"));
        assert_eq!(
            token.content().sub.as_deref(),
            Some("3f804b5a-3e76-4c26-98e6-455d3e353ff7")
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        let raw = sign(&valid_content(), "another_secret");
        assert!(manager.verify_token(&raw).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        let content = TokenContent {
            iss: Some("http://evil.example/realms/voyager-testing".to_string()),
            ..valid_content()
        };
        assert!(manager.verify_token(&sign(&content, "test_secret_key")).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        let content = TokenContent {
            exp: Some(chrono::Utc::now().timestamp() - 3600),
            ..valid_content()
        };
        assert!(manager.verify_token(&sign(&content, "test_secret_key")).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let manager = KeycloakGrantManager::new(&options()).unwrap();
        assert!(manager.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_uma_ticket_form() {
        let client = KeycloakAuthorizationClient::new(
            &options(),
            Arc::new(MockGrantManager::accepting(MockAccessToken::allow_all())),
        );
        let request = AuthorizationRequest {
            permissions: vec![
                PermissionRequest {
                    resource_id: "Article".to_string(),
                    resource_scopes: vec!["view".to_string()],
                },
                PermissionRequest {
                    resource_id: "Comment".to_string(),
                    resource_scopes: vec![],
                },
            ],
            resource_server_id: Some("resource-server".to_string()),
            claim_token: Some("eyJ0ZW5hbnQiOiJhY21lIn0=".to_string()),
        };

        assert_eq!(
            client.uma_ticket_form(&request),
            vec![
                ("grant_type", UMA_TICKET_GRANT.to_string()),
                ("audience", "resource-server".to_string()),
                ("permission", "Article#view".to_string()),
                ("permission", "Comment".to_string()),
                ("claim_token", "eyJ0ZW5hbnQiOiJhY21lIn0=".to_string()),
                ("claim_token_format", JWT_CLAIM_TOKEN_FORMAT.to_string()),
            ]
        );
    }

    #[test]
    fn test_audience_defaults_to_client_id() {
        let client = KeycloakAuthorizationClient::new(
            &options(),
            Arc::new(MockGrantManager::accepting(MockAccessToken::allow_all())),
        );
        let request = AuthorizationRequest {
            permissions: vec![],
            resource_server_id: None,
            claim_token: None,
        };
        let form = client.uma_ticket_form(&request);
        assert_eq!(form[1], ("audience", "voyager-testing".to_string()));
        assert_eq!(form.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_bearer_is_denied_without_request() {
        let client = KeycloakAuthorizationClient::new(
            &options(),
            Arc::new(MockGrantManager::accepting(MockAccessToken::allow_all())),
        );
        let request = AuthorizationRequest {
            permissions: vec![],
            resource_server_id: None,
            claim_token: None,
        };
        let result = client
            .check_permissions(&request, &RequestInfo::default())
            .await;
        assert!(matches!(result, Err(AuthorizationServiceError::Denied(_))));
    }
}
