//! Identity Toolkit client for account creation.
//!
//! Wraps the `accounts:signUp` REST call that backs `/register`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Email already registered")]
    EmailExists,

    #[error("{0}")]
    Rejected(String),

    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity Toolkit REST client.
pub struct IdentityClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl IdentityClient {
    /// Create a client against `base_url` (without trailing slash).
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create an email/password account. Returns the new user's ID.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let url = format!("{}/v1/accounts:signUp", self.base_url);
        let request = SignUpRequest {
            email,
            password,
            return_secure_token: false,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("identity provider returned {}", status));

            // Messages look like "EMAIL_EXISTS" or "WEAK_PASSWORD : Password should be ..."
            if message.split_whitespace().next() == Some("EMAIL_EXISTS") {
                return Err(IdentityError::EmailExists);
            }
            warn!(status = %status, message = %message, "Sign-up rejected");
            return Err(IdentityError::Rejected(message));
        }

        let created: SignUpResponse = response.json().await?;
        info!(uid = %created.local_id, "User registered");
        Ok(created.local_id)
    }
}
