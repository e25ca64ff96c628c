//! In-memory token store.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use souk_core::{CoreError, Credentials, TokenSource, TokenStore};

use crate::record::TokenRecord;

/// [`TokenStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: RwLock<TokenRecord>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with credentials.
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut record = TokenRecord::default();
        record.set_credentials(credentials);
        Self {
            record: RwLock::new(record),
        }
    }

    /// Returns a copy of the current record.
    pub fn snapshot(&self) -> TokenRecord {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, TokenRecord> {
        self.record.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TokenRecord> {
        self.record.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenSource for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    fn store_credentials(&self, credentials: &Credentials) -> Result<(), CoreError> {
        self.write().set_credentials(credentials);
        Ok(())
    }

    fn user_id(&self) -> Option<String> {
        self.read().user_id.clone()
    }

    fn set_user_id(&self, user_id: &str) -> Result<(), CoreError> {
        let mut record = self.write();
        record.user_id = Some(user_id.to_string());
        record.touch();
        Ok(())
    }

    fn cached_profile(&self) -> Option<String> {
        self.read().cached_profile.clone()
    }

    fn set_cached_profile(&self, profile_json: &str) -> Result<(), CoreError> {
        let mut record = self.write();
        record.cached_profile = Some(profile_json.to_string());
        record.touch();
        Ok(())
    }

    fn clear_all(&self) -> Result<(), CoreError> {
        *self.write() = TokenRecord::default();
        Ok(())
    }
}
