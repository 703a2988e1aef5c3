// Shared building blocks
pub mod auth;

pub use auth::*;
