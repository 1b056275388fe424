//! Transport abstraction under the resilient client.
//!
//! The client only needs a status code and a body; keeping HTTP behind a
//! trait lets the composite wire gateways to in-process services and lets
//! tests script downstream behavior without a network.

use async_trait::async_trait;

use crate::error::TransportError;

/// A raw downstream response before error translation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response carrying a JSON body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// One outbound read against a downstream service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET for the given path (service-relative, including any
    /// query string) and returns the raw response.
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;
}

/// Network-backed transport using `reqwest`.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport rooted at the given base URL, e.g.
    /// `http://product:7001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "issuing downstream GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_ok_is_200() {
        let response = RawResponse::ok("{}");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{}");
    }
}
