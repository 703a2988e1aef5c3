//! Kernel module - identity server integration and dependency seams.

pub mod keycloak_client;
pub mod test_dependencies;
pub mod traits;

pub use keycloak_client::{
    KeycloakAuthorizationClient, KeycloakGrantManager, KeycloakOptions, VerificationKey,
};
pub use traits::*;
