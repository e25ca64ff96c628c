//! Core error types for Souk.

use thiserror::Error;

/// Core error type for configuration and storage plumbing.
///
/// This is not the error callers of the network layer switch on; that role
/// belongs to [`crate::ApiError`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A URL could not be parsed or built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Credentials failed validation.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The credential store failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<url::ParseError> for CoreError {
    fn from(err: url::ParseError) -> Self {
        CoreError::InvalidUrl(err.to_string())
    }
}
