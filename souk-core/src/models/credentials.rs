//! Bearer credentials and structural token validation.

use std::fmt;

use crate::error::CoreError;

/// Returns true if `token` has the structural shape of a JWT.
///
/// Exactly three dot-separated, non-blank segments. The signature is not
/// checked.
pub fn is_valid_jwt_shape(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() {
        return false;
    }
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| !part.trim().is_empty())
}

/// A validated access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    refresh_token: Option<String>,
}

impl Credentials {
    /// Creates credentials, rejecting an access token that is not JWT-shaped.
    ///
    /// A blank refresh token is treated as absent.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, CoreError> {
        let access_token = access_token.into();
        if !is_valid_jwt_shape(&access_token) {
            return Err(CoreError::InvalidCredentials(
                "access token is not a three-segment JWT".to_string(),
            ));
        }
        Ok(Self {
            access_token,
            refresh_token: refresh_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Returns the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns these credentials with `fallback` as refresh token when none is set.
    #[must_use]
    pub fn or_refresh_token(mut self, fallback: Option<String>) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = fallback.filter(|t| !t.trim().is_empty());
        }
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
