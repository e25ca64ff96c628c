//! Request model and in-flight identity.
//!
//! - [`HttpMethod`] - The verbs the network layer issues
//! - [`Request`] - A single request description
//! - [`InFlightKey`] - Identity used to share identical in-flight reads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// HTTP Method
// ============================================================================

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read; the only method that is retried and de-duplicated.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
}

impl HttpMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true if requests with this method may carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("Unsupported HTTP method: {other}")),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Description of a single HTTP request.
///
/// A body is only ever attached to non-GET requests; [`Request::with_body`]
/// ignores the body for GET. Standard headers (`Accept`, `Content-Type`,
/// `Authorization`) are applied by the executor, not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: HttpMethod,
    url: Url,
    body: Option<String>,
    headers: Vec<(String, String)>,
    requires_auth: bool,
}

impl Request {
    /// Creates a request that sends the bearer token when one is available.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            headers: Vec::new(),
            requires_auth: true,
        }
    }

    /// Creates a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request with a JSON body.
    pub fn post(url: Url, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    /// Creates a PUT request with a JSON body.
    pub fn put(url: Url, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url).with_body(body)
    }

    /// Creates a PATCH request with a JSON body.
    pub fn patch(url: Url, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url).with_body(body)
    }

    /// Creates a DELETE request without a body.
    pub fn delete(url: Url) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Attaches a JSON body. Ignored for GET.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        if self.method.allows_body() {
            self.body = Some(body.into());
        }
        self
    }

    /// Sets an additional header, replacing an existing one of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Sets whether the bearer token should be attached.
    #[must_use]
    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Marks the request as not needing the bearer token.
    #[must_use]
    pub fn without_auth(self) -> Self {
        self.with_auth(false)
    }

    /// Returns the method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the additional headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns true if the bearer token should be attached.
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Returns the identity used to share this request while in flight.
    pub fn in_flight_key(&self) -> InFlightKey {
        InFlightKey::derive(self.method, &self.url, self.requires_auth, &self.headers)
    }
}

// ============================================================================
// In-Flight Key
// ============================================================================

/// Identity of a read request for single-flight sharing.
///
/// Derived from the method, the normalized URL (fragment dropped), whether
/// auth is required, and the additional headers sorted by lowercased name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey(String);

impl InFlightKey {
    /// Derives the key from its parts.
    pub fn derive(
        method: HttpMethod,
        url: &Url,
        requires_auth: bool,
        headers: &[(String, String)],
    ) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);

        let mut sorted: Vec<(String, &str)> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
            .collect();
        sorted.sort();

        let mut key = format!("{method} {normalized}|auth={requires_auth}");
        for (name, value) in sorted {
            key.push('|');
            key.push_str(&name);
            key.push('=');
            key.push_str(value);
        }
        Self(key)
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_get_never_carries_body() {
        let request = Request::get(url("https://api.example.com/v1/items")).with_body("{}");
        assert_eq!(request.body(), None);

        let request = Request::post(url("https://api.example.com/v1/items"), "{\"a\":1}");
        assert_eq!(request.body(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let request = Request::get(url("https://api.example.com/"))
            .with_header("X-Trace", "1")
            .with_header("x-trace", "2");
        assert_eq!(request.headers(), &[("X-Trace".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_requires_auth_by_default() {
        let request = Request::get(url("https://api.example.com/"));
        assert!(request.requires_auth());
        assert!(!request.without_auth().requires_auth());
    }

    #[test]
    fn test_identical_requests_share_key() {
        let a = Request::get(url("https://API.example.com:443/v1/me#top"))
            .with_header("X-B", "2")
            .with_header("X-A", "1");
        let b = Request::get(url("https://api.example.com/v1/me"))
            .with_header("x-a", "1")
            .with_header("x-b", "2");
        assert_eq!(a.in_flight_key(), b.in_flight_key());
    }

    #[test]
    fn test_key_distinguishes_auth_and_headers() {
        let base = Request::get(url("https://api.example.com/v1/me"));
        let anonymous = base.clone().without_auth();
        let traced = base.clone().with_header("X-Trace", "1");

        assert_ne!(base.in_flight_key(), anonymous.in_flight_key());
        assert_ne!(base.in_flight_key(), traced.in_flight_key());
    }

    #[test]
    fn test_key_distinguishes_method() {
        let target = url("https://api.example.com/v1/orders/1");
        let read = Request::get(target.clone());
        let remove = Request::delete(target);

        assert_ne!(read.in_flight_key(), remove.in_flight_key());
        assert!(read.in_flight_key().as_str().starts_with("GET "));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("TRACE".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
