use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::{KeycloakOptions, VerificationKey};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    /// Audience for delegated permission checks (defaults to the client id)
    pub resource_server_id: String,
    pub verification: VerificationKey,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let keycloak_client_id =
            env::var("KEYCLOAK_CLIENT_ID").context("KEYCLOAK_CLIENT_ID must be set")?;

        let verification = match (
            env::var("KEYCLOAK_REALM_PUBLIC_KEY").ok(),
            env::var("KEYCLOAK_CLIENT_SECRET").ok(),
        ) {
            (Some(pem), _) => VerificationKey::RsaPem(pem),
            (None, Some(secret)) => VerificationKey::Secret(secret),
            (None, None) => {
                bail!("KEYCLOAK_REALM_PUBLIC_KEY or KEYCLOAK_CLIENT_SECRET must be set")
            }
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            keycloak_url: env::var("KEYCLOAK_URL").context("KEYCLOAK_URL must be set")?,
            keycloak_realm: env::var("KEYCLOAK_REALM").context("KEYCLOAK_REALM must be set")?,
            resource_server_id: env::var("KEYCLOAK_RESOURCE_SERVER_ID")
                .unwrap_or_else(|_| keycloak_client_id.clone()),
            keycloak_client_id,
            verification,
        })
    }

    pub fn keycloak_options(&self) -> KeycloakOptions {
        KeycloakOptions {
            url: self.keycloak_url.clone(),
            realm: self.keycloak_realm.clone(),
            client_id: self.keycloak_client_id.clone(),
            verification: self.verification.clone(),
        }
    }
}
