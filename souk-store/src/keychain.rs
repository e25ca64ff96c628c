//! Token storage in the system keychain.
//!
//! This module keeps the credential record in the system's secure storage:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! ## Caching
//!
//! Successful lookups are cached for the lifetime of the store (including
//! "no entry") so a platform that prompts for access only prompts once. A
//! failed read is not cached and is retried on the next lookup. Writes go
//! through to the keychain and update the cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use souk_core::{CoreError, Credentials, TokenSource, TokenStore};
use tracing::{debug, trace, warn};

use crate::error::StoreError;

/// Default keychain service name.
pub const DEFAULT_SERVICE: &str = "souk";

/// Accounts under which each field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    AccessToken,
    RefreshToken,
    UserId,
    CachedProfile,
}

impl Field {
    const ALL: [Field; 4] = [
        Field::AccessToken,
        Field::RefreshToken,
        Field::UserId,
        Field::CachedProfile,
    ];

    fn account(self) -> &'static str {
        match self {
            Field::AccessToken => "access_token",
            Field::RefreshToken => "refresh_token",
            Field::UserId => "user_id",
            Field::CachedProfile => "cached_profile",
        }
    }
}

// ============================================================================
// Keychain Token Store
// ============================================================================

/// [`TokenStore`] backed by the system keychain.
pub struct KeychainTokenStore {
    service: String,
    entries: HashMap<Field, Entry>,
    cache: Mutex<HashMap<Field, Option<String>>>,
}

impl std::fmt::Debug for KeychainTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainTokenStore")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl KeychainTokenStore {
    /// Opens the store under the default service name.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Opens the store under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Result<Self, StoreError> {
        let service = service.into();
        let mut entries = HashMap::new();
        for field in Field::ALL {
            entries.insert(field, Entry::new(&service, field.account())?);
        }
        debug!(service = %service, "Opened keychain token store");
        Ok(Self {
            service,
            entries,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, field: Field) -> Result<&Entry, StoreError> {
        self.entries
            .get(&field)
            .ok_or_else(|| StoreError::Keychain(format!("No entry for {}", field.account())))
    }

    fn get(&self, field: Field) -> Option<String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&field) {
            trace!(account = field.account(), hit = true, "Keychain cache lookup");
            return cached.clone();
        }

        let value = match self.entry(field).map(Entry::get_password) {
            Ok(Ok(value)) if !value.is_empty() => Some(value),
            Ok(Ok(_) | Err(keyring::Error::NoEntry)) => None,
            Ok(Err(e)) => {
                warn!(account = field.account(), error = %e, "Failed to read from keychain");
                return None;
            }
            Err(e) => {
                warn!(account = field.account(), error = %e, "Keychain entry unavailable");
                return None;
            }
        };

        cache.insert(field, value.clone());
        value
    }

    fn set(&self, field: Field, value: Option<&str>) -> Result<(), StoreError> {
        let entry = self.entry(field)?;
        match value {
            Some(value) => entry.set_password(value)?,
            None => match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e.into()),
            },
        }

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field, value.map(str::to_string));
        trace!(account = field.account(), present = value.is_some(), "Keychain entry written");
        Ok(())
    }
}

impl TokenSource for KeychainTokenStore {
    fn access_token(&self) -> Option<String> {
        self.get(Field::AccessToken)
    }
}

impl TokenStore for KeychainTokenStore {
    fn refresh_token(&self) -> Option<String> {
        self.get(Field::RefreshToken)
    }

    fn store_credentials(&self, credentials: &Credentials) -> Result<(), CoreError> {
        self.set(Field::AccessToken, Some(credentials.access_token()))?;
        self.set(Field::RefreshToken, credentials.refresh_token())?;
        Ok(())
    }

    fn user_id(&self) -> Option<String> {
        self.get(Field::UserId)
    }

    fn set_user_id(&self, user_id: &str) -> Result<(), CoreError> {
        Ok(self.set(Field::UserId, Some(user_id))?)
    }

    fn cached_profile(&self) -> Option<String> {
        self.get(Field::CachedProfile)
    }

    fn set_cached_profile(&self, profile_json: &str) -> Result<(), CoreError> {
        Ok(self.set(Field::CachedProfile, Some(profile_json))?)
    }

    fn clear_all(&self) -> Result<(), CoreError> {
        for field in Field::ALL {
            self.set(field, None)?;
        }
        debug!(service = %self.service, "Cleared keychain token store");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
