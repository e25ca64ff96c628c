// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Souk Store
//!
//! Persistence adapters for the Souk client.
//!
//! This crate provides:
//!
//! - **Token stores**: [`MemoryTokenStore`], [`KeychainTokenStore`], and
//!   [`FileTokenStore`], all implementing [`souk_core::TokenStore`]
//! - **Config**: The JSON configuration file with environment overrides
//! - **Persistence**: File I/O helpers for JSON data with owner-only permissions
//!
//! ## Usage
//!
//! ```ignore
//! use souk_store::{Config, open_token_store};
//!
//! let config = Config::load()?;
//! let tokens = open_token_store(config.general.token_store, None)?;
//! let settings = config.client_settings();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod file_store;
pub mod keychain;
pub mod memory;
pub mod persistence;
pub mod record;

pub use backend::{TokenStoreHandle, open_token_store};
pub use config::{
    ApiConfig, AuthConfig, Config, ENV_BACKEND_URL, ENV_FRONTEND_URL, GeneralConfig,
    TokenStoreKind,
};
pub use error::StoreError;
pub use file_store::FileTokenStore;
pub use keychain::{DEFAULT_SERVICE, KeychainTokenStore};
pub use memory::MemoryTokenStore;
pub use persistence::{
    default_config_dir, default_config_path, default_credentials_path, default_data_dir,
    load_json, load_json_if_exists, remove_if_exists, save_json,
};
pub use record::TokenRecord;
