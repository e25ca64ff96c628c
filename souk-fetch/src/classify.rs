//! Response classification.
//!
//! Turns a [`RawResponse`] into either the body or exactly one
//! [`ApiError`] variant. HTML detection runs before status mapping because
//! an upstream proxy may serve an HTML error page with a 200.

use serde_json::Value;
use souk_core::{ApiError, ApiResult};

use crate::error::TransportError;
use crate::transport::RawResponse;

/// Statuses that indicate an upstream gateway failure.
const GATEWAY_STATUSES: [u16; 3] = [502, 503, 504];

// ============================================================================
// Classification
// ============================================================================

/// Classifies a raw response.
pub fn classify_response(response: RawResponse) -> ApiResult<String> {
    if is_html_response(response.content_type(), &response.body) {
        return Err(if GATEWAY_STATUSES.contains(&response.status) {
            ApiError::ServiceUnavailable
        } else {
            ApiError::HtmlResponse
        });
    }

    match response.status {
        200..=299 => Ok(response.body),
        401 => Err(ApiError::Unauthorized),
        403 => Err(ApiError::Forbidden),
        404 => Err(ApiError::NotFound),
        429 => Err(ApiError::RateLimited {
            retry_after_seconds: response.retry_after().and_then(parse_retry_after),
        }),
        status if GATEWAY_STATUSES.contains(&status) => Err(ApiError::ServiceUnavailable),
        _ => Err(extract_server_message(&response.body)
            .map_or_else(ApiError::server_default, ApiError::server)),
    }
}

/// Classifies a transport failure.
pub fn classify_transport_error(error: &TransportError) -> ApiError {
    match error {
        TransportError::Timeout => ApiError::Timeout,
        TransportError::Network(_) => ApiError::NetworkError,
        TransportError::Builder(message) => ApiError::unknown(message.clone()),
    }
}

/// Returns true if the response looks like an HTML page.
pub fn is_html_response(content_type: Option<&str>, body: &str) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return true;
    }
    let head: String = body.trim_start().chars().take(16).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Parses a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

// ============================================================================
// Message Extraction
// ============================================================================

fn top_message(root: &Value) -> Option<&Value> {
    root.get("message")
}

fn top_error(root: &Value) -> Option<&Value> {
    root.get("error")
}

fn first_of_errors(root: &Value) -> Option<&Value> {
    root.get("errors").and_then(|errors| errors.get(0))
}

fn data_message(root: &Value) -> Option<&Value> {
    root.get("data").and_then(|data| data.get("message"))
}

fn data_error(root: &Value) -> Option<&Value> {
    root.get("data").and_then(|data| data.get("error"))
}

/// Lookup order for a human message in an error body.
const MESSAGE_SOURCES: [fn(&Value) -> Option<&Value>; 5] = [
    top_message,
    top_error,
    first_of_errors,
    data_message,
    data_error,
];

/// Extracts a human-readable message from a JSON error body.
///
/// Returns `None` for malformed bodies, non-objects, or when no candidate
/// holds a non-blank string.
pub fn extract_server_message(body: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;
    if !root.is_object() {
        return None;
    }

    MESSAGE_SOURCES
        .iter()
        .filter_map(|source| source(&root))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
