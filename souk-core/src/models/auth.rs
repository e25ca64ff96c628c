//! Authentication state observed by the UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session authentication state.
///
/// `Unknown` is the only valid initial value and is left exactly once, when
/// the session initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// The session has not initialized yet.
    #[default]
    Unknown,
    /// No usable credentials are stored.
    Unauthenticated,
    /// A non-blank access token is stored.
    Authenticated,
}

impl AuthState {
    /// Returns true when authenticated.
    pub fn is_authenticated(&self) -> bool {
        *self == Self::Authenticated
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Unauthenticated => "Signed out",
            Self::Authenticated => "Signed in",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
