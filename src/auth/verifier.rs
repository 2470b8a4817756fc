use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{collect_roles, Claims, Subject};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Identity service unreachable: {0}")]
    Transport(String),
    #[error("Verifier misconfigured: {0}")]
    Misconfigured(String),
}

/// Turns a bearer credential into a [`Subject`]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Subject, VerifyError>;
}

/// Verifies HS256 tokens locally with a shared secret
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Result<Self, VerifyError> {
        if secret.is_empty() {
            return Err(VerifyError::Misconfigured("JWT secret not configured".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Managed auth providers stamp their own audience; it carries no meaning here
        validation.validate_aud = false;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Subject, VerifyError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| VerifyError::Invalid(e.to_string()))?;
        Ok(token_data.claims.into_subject())
    }
}

/// User object returned by the managed auth service
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    app_metadata: Option<Value>,
    #[serde(default)]
    user_metadata: Option<Value>,
}

/// Asks the managed auth service (`GET <base_url>/user`) who the bearer is
pub struct RemoteVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteVerifier {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(VerifyError::Misconfigured("remote auth URL not configured".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Misconfigured(e.to_string()))?;

        Ok(Self { client, base_url, api_key })
    }
}

#[async_trait]
impl IdentityVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<Subject, VerifyError> {
        let mut request = self
            .client
            .get(format!("{}/user", self.base_url))
            .bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(VerifyError::Invalid(format!("identity service answered {}", response.status())));
            }
            status => {
                return Err(VerifyError::Transport(format!("identity service answered {}", status)));
            }
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|e| VerifyError::Transport(format!("unreadable user payload: {}", e)))?;

        let roles = collect_roles(
            user.role.as_deref(),
            user.app_metadata.as_ref(),
            user.user_metadata.as_ref(),
        );
        Ok(Subject { id: user.id, email: user.email, roles })
    }
}
