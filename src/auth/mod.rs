//! Firebase Authentication (email/password) over the Identity Toolkit REST API.
//!
//! These are the client-facing endpoints authenticated with the project's web API key,
//! the same ones a browser or mobile app would call.

pub mod models;

use crate::auth::models::{
    AuthSession, EmailPasswordRequest, GetAccountInfoResponse, IdTokenRequest, OobCodeRequest,
    OobCodeResponse, RefreshTokenRequest, RefreshedSession, UserRecord,
};
use crate::core::parse_error_response;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;


pub const IDENTITY_TOOLKIT_V1_API: &str = "https://identitytoolkit.googleapis.com/v1";
pub const SECURE_TOKEN_V1_API: &str = "https://securetoken.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("EMAIL_EXISTS: an account already exists for this email")]
    EmailExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AuthError {
    pub fn is_email_exists(&self) -> bool {
        matches!(self, AuthError::EmailExists)
    }
}

#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    api_key: String,
    identity_url: String,
    token_url: String,
}

impl FirebaseAuth {
    /// Points the client at alternative endpoints, e.g. the Auth emulator.
    pub fn new_with_urls(
        client: ClientWithMiddleware,
        api_key: String,
        identity_url: String,
        token_url: String,
    ) -> Self {
        Self {
            client,
            api_key,
            identity_url: identity_url.trim_end_matches('/').to_string(),
            token_url: token_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, T>(&self, url: &str, body: &B, default_msg: &str) -> Result<T, AuthError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "identity request");

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = parse_error_response(response, default_msg).await;
            if message.starts_with("EMAIL_EXISTS") {
                return Err(AuthError::EmailExists);
            }
            return Err(AuthError::ApiError(message));
        }

        Ok(response.json().await?)
    }

    /// Registers a new email/password account and signs it in.
    ///
    /// Fails with [`AuthError::EmailExists`] when the address is already registered.
    pub async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}/accounts:signUp", self.identity_url);
        let request = EmailPasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post(&url, &request, "Create user failed").await
    }

    pub async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}/accounts:signInWithPassword", self.identity_url);
        let request = EmailPasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post(&url, &request, "Sign in failed").await
    }

    /// Looks up the account that owns `id_token`.
    pub async fn get_account_info(&self, id_token: &str) -> Result<UserRecord, AuthError> {
        let url = format!("{}/accounts:lookup", self.identity_url);
        let result: GetAccountInfoResponse = self
            .post(&url, &IdTokenRequest { id_token }, "Get account info failed")
            .await?;

        result
            .users
            .and_then(|mut users| users.pop())
            .ok_or(AuthError::UserNotFound)
    }

    /// Exchanges a refresh token for a fresh ID token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedSession, AuthError> {
        let url = format!("{}/token", self.token_url);
        let request = RefreshTokenRequest {
            grant_type: "refresh_token",
            refresh_token,
        };
        self.post(&url, &request, "Refresh token failed").await
    }

    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:sendOobCode", self.identity_url);
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        let _: OobCodeResponse = self
            .post(&url, &request, "Send password reset email failed")
            .await?;
        Ok(())
    }

    /// Deletes the account that owns `id_token`.
    pub async fn delete_user_account(&self, id_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:delete", self.identity_url);
        let _: serde_json::Value = self
            .post(&url, &IdTokenRequest { id_token }, "Delete account failed")
            .await?;
        Ok(())
    }
}
