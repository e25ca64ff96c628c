//! JSON-file token store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use souk_core::{CoreError, Credentials, TokenSource, TokenStore};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_credentials_path, load_json_if_exists, remove_if_exists, save_json};
use crate::record::TokenRecord;

/// [`TokenStore`] persisted as a JSON file with owner-only permissions.
///
/// The record is read once at open and written through on every change.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    record: Mutex<TokenRecord>,
}

impl FileTokenStore {
    /// Opens the store at the default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_credentials_path())
    }

    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let record = load_json_if_exists(&path)?.unwrap_or_default();
        debug!(path = %path.display(), "Opened credential file");
        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, TokenRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<F>(&self, change: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut TokenRecord),
    {
        let mut record = self.lock();
        let mut next = record.clone();
        change(&mut next);
        next.touch();
        save_json(&self.path, &next)?;
        *record = next;
        Ok(())
    }
}

impl TokenSource for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }
}

impl TokenStore for FileTokenStore {
    fn refresh_token(&self) -> Option<String> {
        self.lock().refresh_token.clone()
    }

    fn store_credentials(&self, credentials: &Credentials) -> Result<(), CoreError> {
        self.update(|record| record.set_credentials(credentials))
    }

    fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    fn set_user_id(&self, user_id: &str) -> Result<(), CoreError> {
        self.update(|record| record.user_id = Some(user_id.to_string()))
    }

    fn cached_profile(&self) -> Option<String> {
        self.lock().cached_profile.clone()
    }

    fn set_cached_profile(&self, profile_json: &str) -> Result<(), CoreError> {
        self.update(|record| record.cached_profile = Some(profile_json.to_string()))
    }

    fn clear_all(&self) -> Result<(), CoreError> {
        let mut record = self.lock();
        remove_if_exists(&self.path)?;
        *record = TokenRecord::default();
        info!(path = %self.path.display(), "Cleared credential file");
        Ok(())
    }
}
