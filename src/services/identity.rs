use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when verifying a credential
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid credential")]
    InvalidCredential,

    #[error("identity service error: {0}")]
    ServiceError(String),
}

/// Identity verification client
///
/// Exchanges a bearer credential for a verified subject identifier. Every
/// find request passes through here before any engine work starts.
pub struct IdentityClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl IdentityClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// Verify a bearer credential and return the subject identifier
    pub async fn verify(&self, credential: &str) -> Result<String, IdentityError> {
        let url = format!(
            "{}/v1/accounts:lookup?key={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({ "idToken": credential }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            tracing::debug!("Credential rejected by identity service: {}", status);
            return Err(IdentityError::InvalidCredential);
        }
        if !status.is_success() {
            return Err(IdentityError::ServiceError(format!(
                "identity lookup returned {}",
                status
            )));
        }

        let body: Value = response.json().await?;

        body.get("users")
            .and_then(|u| u.as_array())
            .and_then(|users| users.first())
            .and_then(|user| user.get("localId"))
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or(IdentityError::InvalidCredential)
    }
}
