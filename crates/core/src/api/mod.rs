//! Typed wrappers around the marketplace REST endpoints.
//!
//! Every call issues exactly one request and decodes the shared
//! `{ success, message, data }` envelope. Nothing here touches the stores.

mod articles;
mod auth;
mod error;
mod orders;

pub use error::ApiError;

use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Response wrapper shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Backend-reported outcome.
    #[serde(default)]
    pub success: bool,
    /// Human-readable message, localized by the backend.
    #[serde(default)]
    pub message: String,
    /// Payload, absent on some confirmations.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Technical error detail on failures.
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, ApiError> {
        self.data
            .ok_or_else(|| ApiError::Decode("response is missing the data field".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct FailureBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Create a client pointed at the configured backend.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.backend_url.clone())
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        debug!(%method, path, authenticated = token.is_some(), "backend request");
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<FailureBody>(&body)
                .ok()
                .and_then(|failure| failure.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            warn!(status = status.as_u16(), path = %path, "backend rejected request: {message}");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}
