//! Token store selection.

use std::path::Path;
use std::sync::Arc;

use souk_core::{TokenSource, TokenStore};
use tracing::info;

use crate::config::TokenStoreKind;
use crate::error::StoreError;
use crate::file_store::FileTokenStore;
use crate::keychain::KeychainTokenStore;
use crate::memory::MemoryTokenStore;

/// One store seen through both of its interfaces.
///
/// The executor only reads the bearer token; the session owns the full
/// record. Both handles point at the same store.
#[derive(Clone)]
pub struct TokenStoreHandle {
    /// Full read/write access for the auth session.
    pub store: Arc<dyn TokenStore>,
    /// Read-only bearer access for the request executor.
    pub source: Arc<dyn TokenSource>,
}

impl TokenStoreHandle {
    /// Wraps a concrete store.
    pub fn new<S>(store: S) -> Self
    where
        S: TokenStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            source: store.clone(),
            store,
        }
    }
}

impl std::fmt::Debug for TokenStoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStoreHandle").finish_non_exhaustive()
    }
}

/// Opens the selected backend.
///
/// `file_path` overrides the default location of the file store.
pub fn open_token_store(
    kind: TokenStoreKind,
    file_path: Option<&Path>,
) -> Result<TokenStoreHandle, StoreError> {
    info!(backend = %kind, "Opening token store");
    Ok(match kind {
        TokenStoreKind::Keychain => TokenStoreHandle::new(KeychainTokenStore::new()?),
        TokenStoreKind::File => TokenStoreHandle::new(match file_path {
            Some(path) => FileTokenStore::open(path)?,
            None => FileTokenStore::open_default()?,
        }),
        TokenStoreKind::Memory => TokenStoreHandle::new(MemoryTokenStore::new()),
    })
}
