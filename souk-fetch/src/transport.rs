//! HTTP transport seam.
//!
//! The executor never talks to reqwest directly. It hands a fully prepared
//! request to an [`HttpTransport`] and gets back the raw status, headers,
//! and body. Tests swap in a scripted transport.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use souk_core::HttpMethod;
use tracing::{debug, instrument};
use url::Url;

use crate::error::TransportError;
use crate::redact::redact_url;
use crate::settings::ClientSettings;

// ============================================================================
// Request / Response
// ============================================================================

/// A request with every header already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: Url,
    /// Final header list, in send order.
    pub headers: Vec<(String, String)>,
    /// Body, only for non-GET requests.
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Returns the value of a header, matching names case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What came back from the server, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text.
    pub body: String,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns the `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the raw `Retry-After` header, if present and readable.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends prepared requests over the wire.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the raw response.
    ///
    /// Non-2xx statuses are responses, not errors. Only timeouts and I/O
    /// failures produce a [`TransportError`].
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError>;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// [`HttpTransport`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Builds a transport from client settings.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .timeout(settings.request_deadline())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::Builder(e.to_string()))?;

        Ok(Self::from_client(client))
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { inner: client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %redact_url(&request.url)))]
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .inner
            .request(to_reqwest_method(request.method), request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "Response received");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_headers() {
        let response = RawResponse::new(429, "")
            .with_header("Retry-After", "120")
            .with_header("Content-Type", "application/json");

        assert_eq!(response.retry_after(), Some("120"));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let response = RawResponse::new(200, "").with_header("bad header", "x");
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_transport_builds_from_default_settings() {
        assert!(ReqwestTransport::new(&ClientSettings::default()).is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let client = Client::builder().no_proxy().build().unwrap();
        let transport = ReqwestTransport::from_client(client);
        let request = PreparedRequest {
            method: HttpMethod::Get,
            url: Url::parse("http://127.0.0.1:1/v1/me").unwrap(),
            headers: Vec::new(),
            body: None,
        };

        let result = transport.send(request).await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
