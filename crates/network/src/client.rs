// crates/network/src/client.rs
//! HTTP client wrapper with retry

use crate::error::{NetworkError, NetworkResult};
use crate::retry::RetryPolicy;
use reqwest::{Client as ReqwestClient, Response};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry policy; `None` disables retries
    pub retry_policy: Option<RetryPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Murattal/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: Some(RetryPolicy::new(3).with_initial_delay(Duration::from_millis(100))),
        }
    }
}

/// HTTP client with retry behavior
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Performs a GET request, retrying transport and server errors.
    ///
    /// Client errors (4xx) are never retried; a verse that does not exist
    /// will not appear by asking again.
    pub async fn get(&self, url: &str) -> NetworkResult<Response> {
        let max_attempts = self
            .config
            .retry_policy
            .as_ref()
            .map(|p| p.max_attempts())
            .unwrap_or(1);

        let mut attempts = 0;
        loop {
            attempts += 1;

            match self.inner.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error = NetworkError::Status {
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                    };
                    if status.is_client_error() || attempts >= max_attempts {
                        return Err(error);
                    }
                    log::debug!("GET {} returned {}, retrying", url, status);
                }
                Err(e) => {
                    if attempts >= max_attempts {
                        return Err(NetworkError::Http(e));
                    }
                    log::debug!("GET {} failed ({}), retrying", url, e);
                }
            }

            if let Some(policy) = &self.config.retry_policy {
                tokio::time::sleep(policy.delay_for_attempt(attempts)).await;
            }
        }
    }

    /// Fetches a URL's whole body as bytes.
    pub async fn fetch_bytes(&self, url: &str) -> NetworkResult<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(NetworkError::Http)?;
        Ok(bytes.to_vec())
    }

    /// Fetches a URL's whole body as text.
    pub async fn fetch_text(&self, url: &str) -> NetworkResult<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(NetworkError::Http)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new().expect("Failed to create default client")
    }
}
