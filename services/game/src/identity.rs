//! Identity provider boundary
//!
//! Credential storage, password hashing, and email verification live in an
//! external service. This module owns the HTTP client for that service and the
//! trait the session manager programs against, so tests can swap in a mock.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Identity record held by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: String,
}

/// Successful sign-in payload
#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
    pub user: IdentityUser,
    pub access_token: String,
}

/// Successful sign-up payload
///
/// The provider may withhold the token until the email address is confirmed;
/// callers must treat "registered but no session" as success.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub user: IdentityUser,
    pub access_token: Option<String>,
}

/// Errors crossing the identity boundary
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider rejected the request with a message safe to relay
    /// (credential mismatch, weak password, stale token)
    #[error("{0}")]
    Rejected(String),
    /// The provider could not be reached or answered unexpectedly; the detail
    /// is logged server-side, never shown to the caller
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Operations the application needs from the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignIn, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, IdentityError>;

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    async fn get_user(&self, token: &str) -> Result<IdentityUser, IdentityError>;
}

/// Configuration for the HTTP identity provider client
///
/// # Environment Variables
/// - `IDENTITY_BASE_URL`: base URL of the provider API
/// - `IDENTITY_API_KEY`: optional API key attached to every request
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl IdentityConfig {
    /// Create a new IdentityConfig from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("IDENTITY_BASE_URL")
            .map_err(|_| anyhow::anyhow!("IDENTITY_BASE_URL environment variable not set"))?;

        let api_key = std::env::var("IDENTITY_API_KEY").ok();

        Ok(IdentityConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// HTTP client speaking the provider's JSON API
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: IdentityConfig,
}

/// Error body shapes the provider is known to emit
#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl HttpIdentityProvider {
    /// Create a new provider client
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.config.base_url, path));
        if let Some(key) = &self.config.api_key {
            builder = builder.header("apikey", key);
        }
        builder
    }

    /// Map a non-success response: 4xx messages are relayable, everything else
    /// collapses to a generic unavailability
    async fn rejection(response: reqwest::Response) -> IdentityError {
        let status = response.status();
        if status.is_client_error() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Authentication failed".to_string());
            IdentityError::Rejected(message)
        } else {
            IdentityError::Unavailable(format!("unexpected status {status}"))
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignIn, IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<SignIn>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<SignUp>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    async fn get_user(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<IdentityUser>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}
