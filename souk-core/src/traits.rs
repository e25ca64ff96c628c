//! Trait definitions for Souk.
//!
//! These are the seams to the host environment. The network layer reads the
//! current access token through [`TokenSource`]; the auth session reads and
//! writes the persisted credential set through [`TokenStore`]. Storage
//! technology is the implementor's choice.

use crate::error::CoreError;
use crate::models::Credentials;

/// Read-only access to the current bearer token.
pub trait TokenSource: Send + Sync {
    /// Returns the current access token, if one is stored.
    fn access_token(&self) -> Option<String>;
}

/// Persisted credential set owned by the host.
///
/// Holds exactly four fields: access token, refresh token, user id, and the
/// cached profile JSON blob.
pub trait TokenStore: TokenSource {
    /// Returns the stored refresh token.
    fn refresh_token(&self) -> Option<String>;

    /// Persists a token pair, replacing both stored tokens.
    fn store_credentials(&self, credentials: &Credentials) -> Result<(), CoreError>;

    /// Returns the stored user id.
    fn user_id(&self) -> Option<String>;

    /// Persists the user id.
    fn set_user_id(&self, user_id: &str) -> Result<(), CoreError>;

    /// Returns the last successfully parsed profile payload.
    fn cached_profile(&self) -> Option<String>;

    /// Persists the profile payload.
    fn set_cached_profile(&self, profile_json: &str) -> Result<(), CoreError>;

    /// Removes all four persisted fields.
    fn clear_all(&self) -> Result<(), CoreError>;

    /// Returns true if a non-blank access token is stored.
    fn has_tokens(&self) -> bool {
        self.access_token().is_some_and(|t| !t.trim().is_empty())
    }
}
