//! Classified API errors and the result type every caller receives.
//!
//! [`ApiError`] is a closed set: every failure the network layer surfaces is
//! exactly one of these variants, and each variant carries a default
//! user-facing message through its `Display` impl. Callers match on it
//! exhaustively; there is no catch-all variant to fall through to.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// Default Messages
// ============================================================================

/// Default message for [`ApiError::ServerError`].
pub const DEFAULT_SERVER_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Default message for [`ApiError::DecodingError`].
pub const DEFAULT_DECODING_ERROR_MESSAGE: &str = "Failed to process response.";

/// Default message for [`ApiError::Unknown`].
pub const DEFAULT_UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Underlying cause attached to decoding and unknown errors.
///
/// Reference counted so that one error can be handed to every caller
/// sharing an in-flight request.
pub type ErrorCause = Arc<dyn StdError + Send + Sync>;

// ============================================================================
// API Error
// ============================================================================

/// A classified network-layer failure.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server rejected the credentials (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The credentials lack permission (HTTP 403).
    #[error("Access forbidden")]
    Forbidden,

    /// The resource does not exist (HTTP 404).
    #[error("Resource not found")]
    NotFound,

    /// Too many requests (HTTP 429).
    #[error("Too many requests. Please slow down.")]
    RateLimited {
        /// Value of the `Retry-After` header, if the server sent one.
        retry_after_seconds: Option<u32>,
    },

    /// Upstream gateway failure (HTTP 502/503/504).
    #[error("Service is temporarily unavailable. Please try again in a minute.")]
    ServiceUnavailable,

    /// The transport timed out.
    #[error("Network timeout. Please try again.")]
    Timeout,

    /// Any other transport-level failure.
    #[error("Network connection error. Please check your connection.")]
    NetworkError,

    /// An HTML page arrived where JSON was expected.
    #[error("Received unexpected response. Please try again later.")]
    HtmlResponse,

    /// Any other non-2xx status.
    #[error("{message}")]
    ServerError {
        /// Message extracted from the response body, or the default.
        message: String,
    },

    /// A successful body could not be decoded.
    #[error("{message}")]
    DecodingError {
        /// Human-readable message.
        message: String,
        /// Underlying decoder error.
        #[source]
        cause: Option<ErrorCause>,
    },

    /// Failure that fits no other variant.
    #[error("{message}")]
    Unknown {
        /// Human-readable message.
        message: String,
        /// HTTP status, when one was received.
        status_code: Option<u16>,
        /// Underlying error.
        #[source]
        cause: Option<ErrorCause>,
    },
}

impl ApiError {
    /// Creates a server error with the given message.
    pub fn server(message: impl Into<String>) -> Self {
        Self::ServerError {
            message: message.into(),
        }
    }

    /// Creates a server error carrying the default message.
    pub fn server_default() -> Self {
        Self::server(DEFAULT_SERVER_ERROR_MESSAGE)
    }

    /// Creates a decoding error from an underlying decoder failure.
    pub fn decoding<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::DecodingError {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// Creates an unknown error with the given message.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    /// Returns the user-facing message for this error.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Returns a friendlier message for rate limiting, phrased in minutes.
    ///
    /// Other variants return their regular message.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::RateLimited {
                retry_after_seconds: Some(seconds),
            } => {
                let minutes = (seconds / 60).max(1);
                let plural = if minutes > 1 { "s" } else { "" };
                format!("Too many requests. Please try again in {minutes} minute{plural}.")
            }
            _ => self.user_message(),
        }
    }

    /// Returns true for transport-layer failures worth retrying.
    ///
    /// Only timeouts and network errors qualify. A gateway failure is a
    /// definitive upstream answer and is not retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError)
    }

    /// Returns the HTTP status this error was classified from, if fixed.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Unknown { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Returns a stable snake_case name for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
            Self::HtmlResponse => "html_response",
            Self::ServerError { .. } => "server_error",
            Self::DecodingError { .. } => "decoding_error",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Equality compares variant and payload; the attached `cause` is ignored.
impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::RateLimited {
                    retry_after_seconds: a,
                },
                Self::RateLimited {
                    retry_after_seconds: b,
                },
            ) => a == b,
            (Self::ServerError { message: a }, Self::ServerError { message: b })
            | (Self::DecodingError { message: a, .. }, Self::DecodingError { message: b, .. }) => {
                a == b
            }
            (
                Self::Unknown {
                    message: a,
                    status_code: sa,
                    ..
                },
                Self::Unknown {
                    message: b,
                    status_code: sb,
                    ..
                },
            ) => a == b && sa == sb,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

// ============================================================================
// API Result
// ============================================================================

/// Success value or classified error.
pub type ApiResult<T> = Result<T, ApiError>;

/// Side-effect hooks and defaults for [`ApiResult`].
///
/// Mapping and chaining come from `Result::map` and `Result::and_then`;
/// "value or raise" is the `?` operator.
pub trait ApiResultExt<T> {
    /// Runs `action` on the success value and returns the result unchanged.
    #[must_use]
    fn on_success<F: FnOnce(&T)>(self, action: F) -> Self;

    /// Runs `action` on the error and returns the result unchanged.
    #[must_use]
    fn on_failure<F: FnOnce(&ApiError)>(self, action: F) -> Self;

    /// Returns the success value, or `default` on failure.
    fn value_or(self, default: T) -> T;

    /// Returns true if this is a failure classified as unauthorized.
    fn is_unauthorized(&self) -> bool;
}

impl<T> ApiResultExt<T> for ApiResult<T> {
    fn on_success<F: FnOnce(&T)>(self, action: F) -> Self {
        if let Ok(value) = &self {
            action(value);
        }
        self
    }

    fn on_failure<F: FnOnce(&ApiError)>(self, action: F) -> Self {
        if let Err(error) = &self {
            action(error);
        }
        self
    }

    fn value_or(self, default: T) -> T {
        self.unwrap_or(default)
    }

    fn is_unauthorized(&self) -> bool {
        matches!(self, Err(ApiError::Unauthorized))
    }
}

// ============================================================================
// Tests
// ============================================================================
