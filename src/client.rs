use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::PokemonConfig;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Non-2xx answer. `message` is the upstream one when the body carried it.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("timeout of {timeout_ms}ms exceeded")]
    Timeout { timeout_ms: u64 },
    #[error("{0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Deserialize)]
struct UpstreamError {
    message: Option<String>,
}

/// HTTP client bound to the PokeAPI root. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteClient {
    pub fn new(config: &PokemonConfig) -> Result<Self, TransportError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs returned by the API are used as-is; anything else is joined to the base.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.resolve(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpstreamError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            tracing::error!("{} returned {}: {}", url, status, message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            TransportError::Decode(e.to_string())
        })
    }

    fn map_error(&self, error: reqwest::Error, url: &str) -> TransportError {
        let mapped = if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if error.is_builder() {
            TransportError::InvalidUrl(url.to_string())
        } else {
            TransportError::Network(error.to_string())
        };
        tracing::error!("Failed to make HTTP request to {}: {}", url, mapped);
        mapped
    }
}
