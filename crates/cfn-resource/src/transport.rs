//! # Response Transport
//!
//! The pluggable delivery seam for the response dispatcher. The wire
//! contract is a single HTTP PUT of the serialized response body to the
//! request's pre-signed callback address; the address encodes all the
//! authorization needed, so no headers are added.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// Delivers one response body to a callback address.
#[async_trait]
pub trait ResponseTransport: Send + Sync {
    /// PUTs `body` to `url`, returning the response status code.
    async fn put(&self, url: &str, body: String) -> Result<u16, TransportError>;
}

/// The reference transport, backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseTransport for HttpTransport {
    async fn put(&self, url: &str, body: String) -> Result<u16, TransportError> {
        let response = self
            .client
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
