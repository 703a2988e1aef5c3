use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::common::auth::{parse_bearer, Grant};
use crate::kernel::BaseGrantManager;

/// Bearer token authentication middleware
///
/// Validates the `Authorization: Bearer <token>` header with the grant manager
/// and adds the resulting `Grant` to request extensions. Requests without a
/// valid token continue without a grant (unauthenticated).
pub async fn bearer_auth_middleware(
    grant_manager: Arc<dyn BaseGrantManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let raw_token = bearer_token(request.headers());

    if let Some(grant) = authenticate(raw_token, grant_manager.as_ref()).await {
        request.extensions_mut().insert(grant);
    }

    next.run(request).await
}

/// Validate a bearer token with the grant manager
pub async fn authenticate(
    raw_token: Option<String>,
    grant_manager: &dyn BaseGrantManager,
) -> Option<Grant> {
    let Some(raw_token) = raw_token else {
        debug!("No bearer token");
        return None;
    };

    match grant_manager.create_grant(&raw_token).await {
        Ok(grant) => {
            debug!("Bearer token accepted");
            Some(grant)
        }
        Err(err) => {
            debug!(error = %err, "Bearer token rejected");
            None
        }
    }
}

/// Token part of the `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    parse_bearer(value).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockAccessToken, MockGrantManager};
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_authenticate_with_bearer() {
        let grant_manager = MockGrantManager::accepting(MockAccessToken::allow_all());

        let raw_token = bearer_token(&headers("Bearer abc.def.ghi"));
        let grant = authenticate(raw_token, &grant_manager).await;
        assert!(grant.unwrap().access_token().is_some());
        assert_eq!(grant_manager.calls(), vec!["abc.def.ghi"]);
    }

    #[tokio::test]
    async fn test_lowercase_scheme() {
        let grant_manager = MockGrantManager::accepting(MockAccessToken::allow_all());

        assert!(authenticate(bearer_token(&headers("bearer abc")), &grant_manager).await.is_some());
    }

    #[tokio::test]
    async fn test_raw_token_without_scheme_is_ignored() {
        let grant_manager = MockGrantManager::accepting(MockAccessToken::allow_all());

        let raw_token = bearer_token(&headers("abc.def.ghi"));
        assert!(authenticate(raw_token, &grant_manager).await.is_none());
        assert!(grant_manager.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_auth_header() {
        let grant_manager = MockGrantManager::accepting(MockAccessToken::allow_all());

        assert!(authenticate(bearer_token(&HeaderMap::new()), &grant_manager).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let grant_manager = MockGrantManager::rejecting("signature mismatch");

        let raw_token = bearer_token(&headers("Bearer invalid_token"));
        assert!(authenticate(raw_token, &grant_manager).await.is_none());
        assert_eq!(grant_manager.calls(), vec!["invalid_token"]);
    }
}
