//! A small client for a Firebase project's Authentication and Realtime Database REST APIs,
//! and the connectivity smoke test built on it.

pub mod auth;
pub mod config;
pub mod core;
pub mod database;
pub mod probe;

use crate::auth::FirebaseAuth;
use crate::config::{ConfigError, FirebaseConfig};
use crate::core::middleware::AuthMiddleware;
use crate::database::FirebaseDatabase;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;

/// A handle bound to one Firebase project.
pub struct FirebaseApp {
    config: FirebaseConfig,
    http: Client,
    database_url: String,
    middleware: Option<AuthMiddleware>,
}

impl FirebaseApp {
    /// Validates `config`, loads the service-account key if one is configured and prepares
    /// the clients. No request is sent.
    pub async fn initialize(config: FirebaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let database_url = config.database_base_url()?;

        let middleware = match &config.service_account_key_path {
            Some(path) => {
                let key = yup_oauth2::read_service_account_key(path)
                    .await
                    .map_err(|source| ConfigError::ServiceAccount {
                        path: path.clone(),
                        source,
                    })?;

                if let (Some(expected), Some(actual)) = (&config.project_id, &key.project_id) {
                    if expected != actual {
                        tracing::warn!(
                            %expected,
                            %actual,
                            "service account belongs to another project"
                        );
                    }
                }

                // The emulator accepts unauthenticated requests.
                if config.database_emulator().is_some() {
                    None
                } else {
                    Some(AuthMiddleware::new(key))
                }
            }
            None => None,
        };

        tracing::info!(
            project = config.project_id.as_deref().unwrap_or("<unset>"),
            %database_url,
            service_account = middleware.is_some(),
            "firebase app initialised"
        );

        Ok(Self {
            config,
            http: Client::new(),
            database_url,
            middleware,
        })
    }

    pub fn auth(&self) -> FirebaseAuth {
        let (identity_url, token_url) = self.config.auth_urls();
        FirebaseAuth::new_with_urls(
            ClientBuilder::new(self.http.clone()).build(),
            self.config.api_key.clone(),
            identity_url,
            token_url,
        )
    }

    pub fn database(&self) -> FirebaseDatabase {
        FirebaseDatabase::new(
            self.http.clone(),
            self.middleware.clone(),
            self.database_url.clone(),
        )
    }
}
