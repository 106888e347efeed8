//! Project configuration, read from the environment.
//!
//! `FIREBASE_*` variables describe the project the same way the web SDK's config object does
//! (`FIREBASE_API_KEY`, `FIREBASE_DATABASE_URL`, ...). `SERVICE_ACCOUNT_KEY_PATH` points at the
//! service-account JSON, and `SMOKE_*` variables tune the probe.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::auth::{IDENTITY_TOOLKIT_V1_API, SECURE_TOKEN_V1_API};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment: {0}")]
    Env(#[from] envy::Error),
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    #[error("invalid database URL '{url}': {reason}")]
    InvalidDatabaseUrl { url: String, reason: String },
    #[error("failed to read service account key at {}: {source}", path.display())]
    ServiceAccount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn default_identity_toolkit_url() -> String {
    IDENTITY_TOOLKIT_V1_API.to_string()
}

fn default_secure_token_url() -> String {
    SECURE_TOKEN_V1_API.to_string()
}

/// Connection details of a Firebase project.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: Option<String>,
    pub database_url: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    /// `FIREBASE_AUTH_EMULATOR_HOST`, e.g. `127.0.0.1:9099`.
    #[serde(default)]
    pub auth_emulator_host: Option<String>,
    /// `FIREBASE_DATABASE_EMULATOR_HOST`, e.g. `127.0.0.1:9000`.
    #[serde(default)]
    pub database_emulator_host: Option<String>,
    #[serde(default = "default_identity_toolkit_url")]
    pub identity_toolkit_url: String,
    #[serde(default = "default_secure_token_url")]
    pub secure_token_url: String,
    /// Not read from `FIREBASE_*`; filled from `SERVICE_ACCOUNT_KEY_PATH`.
    #[serde(skip)]
    pub service_account_key_path: Option<PathBuf>,
}

impl FirebaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed("FIREBASE_").from_env::<FirebaseConfig>()?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("FIREBASE_API_KEY"));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("FIREBASE_DATABASE_URL"));
        }
        self.parsed_database_url()?;

        for host in [self.auth_emulator(), self.database_emulator()].into_iter().flatten() {
            let parsed = Url::parse(&format!("http://{}/", host));
            if !matches!(parsed, Ok(ref url) if url.host_str().is_some_and(|h| !h.is_empty())) {
                return Err(ConfigError::InvalidDatabaseUrl {
                    url: host.to_string(),
                    reason: "invalid emulator host".to_string(),
                });
            }
        }
        Ok(())
    }

    /// `FIREBASE_AUTH_EMULATOR_HOST`, unless unset or blank.
    pub fn auth_emulator(&self) -> Option<&str> {
        non_blank(&self.auth_emulator_host)
    }

    /// `FIREBASE_DATABASE_EMULATOR_HOST`, unless unset or blank.
    pub fn database_emulator(&self) -> Option<&str> {
        non_blank(&self.database_emulator_host)
    }

    fn parsed_database_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDatabaseUrl {
            url: self.database_url.clone(),
            reason,
        };

        let url = Url::parse(&self.database_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }

    /// Base URL for database requests, honouring the database emulator.
    ///
    /// The emulator serves every database from one host and picks the instance with the `ns`
    /// query parameter, which is the first label of the production hostname.
    pub fn database_base_url(&self) -> Result<String, ConfigError> {
        let url = self.parsed_database_url()?;

        match self.database_emulator() {
            Some(host) => {
                let namespace = url
                    .host_str()
                    .and_then(|h| h.split('.').next())
                    .unwrap_or_default();
                Ok(format!("http://{}/?ns={}", host, namespace))
            }
            None => Ok(self.database_url.clone()),
        }
    }

    /// Identity Toolkit and secure token base URLs, honouring the Auth emulator.
    pub fn auth_urls(&self) -> (String, String) {
        match self.auth_emulator() {
            Some(host) => (
                format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                format!("http://{}/securetoken.googleapis.com/v1", host),
            ),
            None => (
                self.identity_toolkit_url.clone(),
                self.secure_token_url.clone(),
            ),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn default_fallback_email() -> String {
    "known_test@klarityfinanzas.com".to_string()
}

fn default_password() -> String {
    "password123".to_string()
}

fn default_email_domain() -> String {
    "klarityfinanzas.com".to_string()
}

/// Knobs for the smoke test itself, read from `SMOKE_*`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeOptions {
    /// Identity signed in when the throwaway account already exists.
    #[serde(default = "default_fallback_email")]
    pub fallback_email: String,
    #[serde(default = "default_password")]
    pub fallback_password: String,
    /// Password of the throwaway account.
    #[serde(default = "default_password")]
    pub test_password: String,
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
    /// Also delete the whole test user node at the end of the run.
    #[serde(default)]
    pub remove_test_user: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            fallback_email: default_fallback_email(),
            fallback_password: default_password(),
            test_password: default_password(),
            email_domain: default_email_domain(),
            remove_test_user: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsEnv {
    service_account_key_path: String,
}

/// Everything the smoke test needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub firebase: FirebaseConfig,
    pub service_account_key_path: PathBuf,
    pub probe: ProbeOptions,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let firebase = FirebaseConfig::from_env()?;
        let credentials: CredentialsEnv = envy::from_env()?;
        let probe = envy::prefixed("SMOKE_").from_env::<ProbeOptions>()?;

        Ok(Self {
            firebase,
            service_account_key_path: PathBuf::from(credentials.service_account_key_path),
            probe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: &str) -> FirebaseConfig {
        FirebaseConfig {
            api_key: "test-api-key".to_string(),
            auth_domain: None,
            database_url: database_url.to_string(),
            project_id: Some("demo-project".to_string()),
            storage_bucket: None,
            auth_emulator_host: None,
            database_emulator_host: None,
            identity_toolkit_url: default_identity_toolkit_url(),
            secure_token_url: default_secure_token_url(),
            service_account_key_path: None,
        }
    }

    #[test]
    fn test_validate_accepts_database_url() {
        let config = config("https://demo-project-default-rtdb.firebaseio.com");
        config.validate().unwrap();
        assert_eq!(
            config.database_base_url().unwrap(),
            "https://demo-project-default-rtdb.firebaseio.com"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut missing_key = config("https://demo-project-default-rtdb.firebaseio.com");
        missing_key.api_key = "  ".to_string();
        assert!(matches!(
            missing_key.validate(),
            Err(ConfigError::Missing("FIREBASE_API_KEY"))
        ));

        assert!(matches!(
            config("not a url").validate(),
            Err(ConfigError::InvalidDatabaseUrl { .. })
        ));
        assert!(matches!(
            config("ftp://demo-project.firebaseio.com").validate(),
            Err(ConfigError::InvalidDatabaseUrl { .. })
        ));
    }

    #[test]
    fn test_emulator_hosts() {
        let mut config =
            config("https://demo-project-default-rtdb.europe-west1.firebasedatabase.app");
        config.auth_emulator_host = Some("127.0.0.1:9099".to_string());
        config.database_emulator_host = Some("127.0.0.1:9000".to_string());

        assert_eq!(
            config.database_base_url().unwrap(),
            "http://127.0.0.1:9000/?ns=demo-project-default-rtdb"
        );
        let (identity, token) = config.auth_urls();
        assert_eq!(identity, "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1");
        assert_eq!(token, "http://127.0.0.1:9099/securetoken.googleapis.com/v1");
    }

    #[test]
    fn test_blank_emulator_hosts_are_ignored() {
        let mut config = config("https://demo-project-default-rtdb.firebaseio.com");
        config.auth_emulator_host = Some(String::new());
        config.database_emulator_host = Some("  ".to_string());

        config.validate().unwrap();
        assert_eq!(config.database_emulator(), None);
        assert_eq!(
            config.database_base_url().unwrap(),
            "https://demo-project-default-rtdb.firebaseio.com"
        );
        assert_eq!(config.auth_urls().0, IDENTITY_TOOLKIT_V1_API);
    }

    #[test]
    fn test_validate_rejects_bad_emulator_host() {
        let mut config = config("https://demo-project-default-rtdb.firebaseio.com");
        config.database_emulator_host = Some(":9000".to_string());

        match config.validate() {
            Err(ConfigError::InvalidDatabaseUrl { url, .. }) => assert_eq!(url, ":9000"),
            other => panic!("expected InvalidDatabaseUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_probe_defaults() {
        let options = ProbeOptions::default();
        assert_eq!(options.fallback_email, "known_test@klarityfinanzas.com");
        assert!(!options.remove_test_user);
    }
}
