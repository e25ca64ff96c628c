//! Fetch error types.
//!
//! These stay inside the crate boundary: the executor turns every
//! [`TransportError`] into a classified [`souk_core::ApiError`] before a
//! caller sees it.

use thiserror::Error;

// ============================================================================
// Transport Error
// ============================================================================

/// Low-level failure raised by an [`crate::HttpTransport`].
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connect, write, or read budget elapsed.
    #[error("Request timed out")]
    Timeout,

    /// Any other I/O or protocol failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Builder(String),
}

impl TransportError {
    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::Builder(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
