//! Session error types.

use souk_core::{ApiError, CoreError};
use thiserror::Error;

/// Errors returned by login, registration, exchange, and refresh.
///
/// Bootstrap never returns these: its failures are absorbed or become a
/// sign-out.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server answered 2xx but the body was not a usable auth envelope.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The returned access token is not JWT-shaped.
    #[error("Access token is not a valid JWT")]
    InvalidTokenShape,

    /// Refresh was requested with no refresh token stored.
    #[error("No refresh token stored")]
    MissingRefreshToken,

    /// The token store rejected a write.
    #[error("Storage error: {0}")]
    Storage(#[from] CoreError),
}

impl SessionError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(err) => err.user_message(),
            SessionError::InvalidResponse(_) | SessionError::InvalidTokenShape => {
                "Invalid response from server".to_string()
            }
            SessionError::MissingRefreshToken => "Please sign in again.".to_string(),
            SessionError::Storage(_) => "Could not save your session.".to_string(),
        }
    }

    /// Returns the classified error, if this came from the network.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(err) => Some(err),
            _ => None,
        }
    }
}
