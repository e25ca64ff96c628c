//! The persisted credential record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use souk_core::Credentials;

/// The four persisted fields plus a modification stamp.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Id of the signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Last successfully parsed profile payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_profile: Option<String>,
    /// When any field last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Replaces both tokens.
    pub fn set_credentials(&mut self, credentials: &Credentials) {
        self.access_token = Some(credentials.access_token().to_string());
        self.refresh_token = credentials.refresh_token().map(str::to_string);
        self.touch();
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.user_id.is_none()
            && self.cached_profile.is_none()
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("user_id", &self.user_id)
            .field("has_cached_profile", &self.cached_profile.is_some())
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
