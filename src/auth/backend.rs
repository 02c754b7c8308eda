//! Credential backend interface and HTTP implementation.
//!
//! The gateway never stores credentials durably; token validation and
//! webhook-secret lookup are delegated to the core service behind this
//! trait. Implementations must be safe to call concurrently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;

/// Errors surfaced by a credential backend.
///
/// The two variants drive the gateway's error taxonomy: `Unavailable` maps
/// to `BackendUnavailable`, `Rejected` to `TokenRejected` /
/// `SecretUnavailable`.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached, timed out, or failed server-side.
    #[error("credential backend unavailable: {0}")]
    Unavailable(String),
    /// The backend was reached and explicitly rejected the credential.
    #[error("credential rejected: {0}")]
    Rejected(String),
}

/// Remote service that owns token/project bindings and webhook secrets.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Validate an opaque token, returning the owning project identifier.
    async fn validate_token(&self, token: &str) -> Result<String, BackendError>;

    /// Fetch the shared webhook secret for a `(project, source)` pair.
    async fn get_webhook_secret(
        &self,
        project_key: &str,
        source: &str,
    ) -> Result<String, BackendError>;
}

#[derive(Serialize)]
struct ValidateTokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateTokenResponse {
    #[serde(default)]
    project_id: String,
    valid: bool,
}

#[derive(Deserialize)]
struct WebhookSecretResponse {
    secret: String,
}

/// `CredentialBackend` speaking the core service's JSON HTTP API.
pub struct HttpCredentialBackend {
    client: reqwest::Client,
    base_url: String,
    token_endpoint: String,
    secret_endpoint: String,
}

impl HttpCredentialBackend {
    /// Build a backend client for the configured core service.
    pub fn new(config: &BackendConfig, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_endpoint: config.token_endpoint.clone(),
            secret_endpoint: config.secret_endpoint.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Classify a non-success response: server-side failures are transient,
    /// everything else is a definitive rejection.
    fn classify_status(status: reqwest::StatusCode) -> BackendError {
        if status.is_server_error() {
            BackendError::Unavailable(format!("backend returned {}", status))
        } else {
            BackendError::Rejected(format!("backend returned {}", status))
        }
    }
}

#[async_trait]
impl CredentialBackend for HttpCredentialBackend {
    async fn validate_token(&self, token: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url(&self.token_endpoint))
            .json(&ValidateTokenRequest { token })
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status));
        }

        let body: ValidateTokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("malformed backend response: {}", e)))?;

        if !body.valid {
            return Err(BackendError::Rejected("token is not valid".to_string()));
        }
        Ok(body.project_id)
    }

    async fn get_webhook_secret(
        &self,
        project_key: &str,
        source: &str,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .get(self.url(&self.secret_endpoint))
            .query(&[("projectKey", project_key), ("source", source)])
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status));
        }

        let body: WebhookSecretResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("malformed backend response: {}", e)))?;
        Ok(body.secret)
    }
}
