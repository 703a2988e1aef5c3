// HTTP server setup (Axum + GraphQL)
pub mod app;
pub mod demo;
pub mod graphql;
pub mod middleware;
pub mod routes;
pub mod subscription;

pub use app::*;
pub use graphql::*;
pub use subscription::SubscriptionHandler;
