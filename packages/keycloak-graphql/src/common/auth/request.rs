use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, Method, Uri};

/// The parts of the originating request the authorization layer needs
///
/// Owned so it can travel with per-request and per-connection contexts.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Request info for a connection authenticated out of band (handshake params)
    pub fn with_authorization(authorization: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(authorization) {
            headers.insert(AUTHORIZATION, value);
        }
        Self {
            headers,
            ..Default::default()
        }
    }

    /// Raw value of the Authorization header, if any
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }

    /// Token part of a `Bearer <token>` Authorization header
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization().and_then(parse_bearer)
    }
}

/// Split a `Bearer <token>` value, accepting the scheme in any case
pub fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' ') {
        Some(token)
    } else {
        None
    }
}
