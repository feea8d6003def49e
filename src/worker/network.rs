//! The network behind the worker.
//!
//! [`Network`] is the seam strategies call through; [`HttpNetwork`] is the
//! real client, [`OfflineNetwork`] simulates a dropped connection.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

use super::request::FetchRequest;
use super::response::FetchResponse;

/// Something that can answer a request.
///
/// An `Err` means the network itself failed (offline, DNS, timeout). HTTP
/// error statuses are ordinary responses.
pub trait Network: Send + Sync + 'static {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// Fetches over HTTP/HTTPS.
pub struct HttpNetwork {
    client: Client,
    timeout: Duration,
}

impl HttpNetwork {
    /// Create a client with the default 30-second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("larder/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, timeout })
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        if let Some(accept) = &request.accept {
            builder = builder.header("accept", accept);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Request to {} failed", request.url))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body from {}", request.url))?;

        Ok(FetchResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// A network that is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineNetwork;

impl Network for OfflineNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        bail!("Offline: {} not fetched", request.url)
    }
}
