// Keycloak GraphQL - field authorization for GraphQL servers
//
// Schema authors annotate fields with @auth, @hasRole and @hasPermission.
// The directive transformer guards those fields; guards consult the caller's
// capabilities, built from a Keycloak access token per request or per
// subscription connection.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
