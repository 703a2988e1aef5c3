use juniper::{FieldError, IntoFieldError, Object, Value};
use thiserror::Error;

/// Field-level authentication and authorization failures
///
/// These surface as GraphQL field errors. Sibling fields keep resolving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error(
        "User is not authorized. Must have one of the following roles: [{}]",
        .0.join(",")
    )]
    MissingRole(Vec<String>),

    #[error(
        "User is not authorized. Must have the following permissions: [{}]",
        .0.join(",")
    )]
    MissingPermission(Vec<String>),
}

impl AuthError {
    /// Error code placed in the GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "UNAUTHENTICATED",
            AuthError::MissingRole(_) | AuthError::MissingPermission(_) => "FORBIDDEN",
        }
    }
}

impl IntoFieldError for AuthError {
    fn into_field_error(self) -> FieldError {
        let mut extensions = Object::with_capacity(1);
        extensions.add_field("code", Value::scalar(self.code().to_string()));
        FieldError::new(self.to_string(), Value::object(extensions))
    }
}

/// Failures talking to the external authorization service
///
/// Never reaches GraphQL: the permission evaluator treats all of these as a denial.
#[derive(Error, Debug)]
pub enum AuthorizationServiceError {
    #[error("Authorization request denied: {0}")]
    Denied(String),

    #[error("Authorization server returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Request to authorization server failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid token in authorization response: {0}")]
    InvalidToken(#[from] TokenError),
}

/// Bearer token decoding and verification failures
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid or expired token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Connection handshake rejections for long-lived (subscription) connections
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("Access Denied - missing connection parameters for Authentication")]
    MissingConnectionParams,

    #[error("Access Denied - missing Authorization field in connection parameters")]
    MissingAuthorization,

    #[error(
        "Access Denied - Error: Invalid Authorization field in connection params. Must be in the format \"Authorization\": \"Bearer <token string>\""
    )]
    MalformedAuthorization,

    #[error("Access Denied - {0}")]
    GrantFailed(#[from] TokenError),
}
