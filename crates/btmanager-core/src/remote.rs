//! HTTP client for the device backend.
//!
//! The backend exposes two endpoints relative to a base URL:
//!
//! - `GET devices/` returns a JSON array of devices
//! - `POST add/` takes one device and returns the stored copy (the server
//!   may rewrite `created_at`)
//!
//! # Example
//!
//! ```no_run
//! use btmanager_core::{Device, HttpDeviceClient, RemoteSyncClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpDeviceClient::new("https://devices.example.com/api")?;
//!
//! let devices = client.fetch_all().await?;
//! println!("Server knows {} devices", devices.len());
//!
//! let stored = client.add(&Device::new("Speaker", "AA:BB:CC:DD:EE:FF", -48)).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use btmanager_types::Device;

use crate::traits::RemoteSyncClient;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The backend is not reachable.
    #[error("Backend not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body is missing or not the expected JSON.
    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl RemoteError {
    /// Whether retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotReachable { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) | Self::Decode { .. } => false,
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// `reqwest`-backed [`RemoteSyncClient`].
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    client: Client,
    base_url: String,
}

impl HttpDeviceClient {
    /// Create a client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the backend (e.g., "https://devices.example.com/api")
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::Request)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET devices/`.
    pub async fn fetch_devices(&self) -> RemoteResult<Vec<Device>> {
        let url = self.endpoint("devices/");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::NotReachable {
                url: url.clone(),
                source: e,
            })?;

        let body = read_body(&url, response).await?;
        let devices: Vec<Device> = parse_json(&url, &body)?;
        debug!(count = devices.len(), "Fetched devices from backend");
        Ok(devices)
    }

    /// `POST add/`.
    pub async fn add_device(&self, device: &Device) -> RemoteResult<Option<Device>> {
        let url = self.endpoint("add/");
        let response = self
            .client
            .post(&url)
            .json(device)
            .send()
            .await
            .map_err(|e| RemoteError::NotReachable {
                url: url.clone(),
                source: e,
            })?;

        let body = read_body(&url, response).await?;
        if body.trim().is_empty() {
            debug!(address = %device.address, "Backend stored device without echo");
            return Ok(None);
        }
        parse_json(&url, &body).map(Some)
    }
}

#[async_trait]
impl RemoteSyncClient for HttpDeviceClient {
    async fn fetch_all(&self) -> RemoteResult<Vec<Device>> {
        self.fetch_devices().await
    }

    async fn add(&self, device: &Device) -> RemoteResult<Option<Device>> {
        self.add_device(device).await
    }
}

fn normalize_base_url(base_url: &str) -> RemoteResult<String> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(RemoteError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

/// Read the body of a success response, or turn the status into an error.
async fn read_body(url: &str, response: reqwest::Response) -> RemoteResult<String> {
    let status = response.status();
    if status.is_success() {
        return response.text().await.map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        });
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string());

    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

fn parse_json<T: DeserializeOwned>(url: &str, body: &str) -> RemoteResult<T> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
