//! Configuration management.

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json_if_exists, save_json};
use serde::{Deserialize, Serialize};
use souk_fetch::{ClientSettings, RetryPolicy};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding the API base URL.
pub const ENV_BACKEND_URL: &str = "SOUK_BACKEND_URL";

/// Environment variable overriding the web frontend base URL.
pub const ENV_FRONTEND_URL: &str = "SOUK_FRONTEND_URL";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Network settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Auth endpoint paths.
    #[serde(default)]
    pub auth: AuthConfig,
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Base URLs, timeouts, and retry schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL. `/v1` is appended during normalization.
    pub backend_url: String,
    /// Web frontend base URL, used for the proxied refresh.
    pub frontend_url: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Write timeout in seconds.
    pub write_timeout_secs: u64,
    /// Read timeout in seconds.
    pub read_timeout_secs: u64,
    /// Additional attempts for GET after the first.
    pub max_retries: u32,
    /// Backoff schedule in milliseconds.
    pub backoff_ms: Vec<u64>,
    /// Delay after the schedule runs out, in milliseconds.
    pub fallback_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_url: "https://api.souk.app".to_string(),
            frontend_url: "https://souk.app".to_string(),
            connect_timeout_secs: souk_fetch::DEFAULT_CONNECT_TIMEOUT_SECS,
            write_timeout_secs: souk_fetch::DEFAULT_WRITE_TIMEOUT_SECS,
            read_timeout_secs: souk_fetch::DEFAULT_READ_TIMEOUT_SECS,
            max_retries: souk_fetch::DEFAULT_MAX_RETRIES,
            backoff_ms: vec![400, 800],
            fallback_delay_ms: 800,
        }
    }
}

/// Relative paths of the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Profile endpoints, tried in order during bootstrap.
    pub profile_paths: Vec<String>,
    /// Primary refresh, relative to the API base.
    pub refresh_path: String,
    /// Fallback refresh, relative to the frontend base.
    pub proxy_refresh_path: String,
    /// Identity-provider token exchange.
    pub exchange_path: String,
    /// Email/password login.
    pub login_path: String,
    /// Email/password registration.
    pub register_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            profile_paths: vec![
                "account/me".to_string(),
                "users/get/profile".to_string(),
                "user/get/profile".to_string(),
            ],
            refresh_path: "auth/refresh-token".to_string(),
            proxy_refresh_path: "api/proxy/auth/refresh-token".to_string(),
            exchange_path: "auth/auth0/callback".to_string(),
            login_path: "auth/login/email".to_string(),
            register_path: "auth/signup/email".to_string(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter used when no flag is given.
    pub log_level: String,
    /// Backend for persisted credentials.
    pub token_store: TokenStoreKind,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            token_store: TokenStoreKind::default(),
        }
    }
}

/// Which [`souk_core::TokenStore`] implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// System keychain.
    #[default]
    Keychain,
    /// JSON file with owner-only permissions.
    File,
    /// Process memory only.
    Memory,
}

impl fmt::Display for TokenStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keychain => "keychain",
            Self::File => "file",
            Self::Memory => "memory",
        })
    }
}

impl FromStr for TokenStoreKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" => Ok(Self::Keychain),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::Config(format!("Unknown token store: {other}"))),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads from the default path and applies environment overrides.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_with_env(&Self::default_path())
    }

    /// Loads from `path` and applies environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, StoreError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        match load_json_if_exists(path)? {
            Some(config) => {
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies overrides from a variable lookup. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_blank(ENV_BACKEND_URL) {
            debug!(var = ENV_BACKEND_URL, "Overriding backend URL");
            self.api.backend_url = url;
        }
        if let Some(url) = non_blank(ENV_FRONTEND_URL) {
            debug!(var = ENV_FRONTEND_URL, "Overriding frontend URL");
            self.api.frontend_url = url;
        }
    }

    /// Checks the values that cannot be defaulted.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.api.backend_url.trim().is_empty() {
            return Err(StoreError::Config("api.backend_url is empty".to_string()));
        }
        if self.api.frontend_url.trim().is_empty() {
            return Err(StoreError::Config("api.frontend_url is empty".to_string()));
        }
        if self.auth.profile_paths.iter().all(|p| p.trim().is_empty()) {
            return Err(StoreError::Config(
                "auth.profile_paths needs at least one endpoint".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the HTTP client settings.
    pub fn client_settings(&self) -> ClientSettings {
        let retry = RetryPolicy::new(self.api.max_retries)
            .with_backoff(
                self.api
                    .backoff_ms
                    .iter()
                    .map(|ms| Duration::from_millis(*ms))
                    .collect(),
            )
            .with_fallback_delay(Duration::from_millis(self.api.fallback_delay_ms));

        ClientSettings::default()
            .with_timeouts(
                Duration::from_secs(self.api.connect_timeout_secs),
                Duration::from_secs(self.api.write_timeout_secs),
                Duration::from_secs(self.api.read_timeout_secs),
            )
            .with_retry(retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.auth.profile_paths.len(), 3);
        assert_eq!(config.general.token_store, TokenStoreKind::Keychain);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api":{"backend_url":"staging.example.com","max_retries":4},"general":{"token_store":"file"}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.api.backend_url, "staging.example.com");
        assert_eq!(config.api.max_retries, 4);
        assert_eq!(config.api.read_timeout_secs, 60);
        assert_eq!(config.auth, AuthConfig::default());
        assert_eq!(config.general.token_store, TokenStoreKind::File);
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("souk").join("config.json");
        let mut config = Config::default();
        config.auth.profile_paths = vec!["me".to_string()];

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            ENV_BACKEND_URL => Some("http://localhost:4000".to_string()),
            ENV_FRONTEND_URL => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.api.backend_url, "http://localhost:4000");
        assert_eq!(config.api.frontend_url, ApiConfig::default().frontend_url);
    }

    #[test]
    fn test_validate_rejects_blank_urls() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.backend_url = " ".to_string();
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));

        let mut config = Config::default();
        config.auth.profile_paths.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_settings_from_config() {
        let mut config = Config::default();
        config.api.backoff_ms = vec![10, 20];
        config.api.fallback_delay_ms = 30;
        config.api.max_retries = 3;

        let settings = config.client_settings();

        assert_eq!(settings.connect_timeout, Duration::from_secs(30));
        assert_eq!(settings.read_timeout, Duration::from_secs(60));
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.retry.delay_for_attempt(2), Duration::from_millis(20));
        assert_eq!(settings.retry.delay_for_attempt(3), Duration::from_millis(30));
    }

    #[test]
    fn test_token_store_kind_parsing() {
        assert_eq!("Memory".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Memory);
        assert!("vault".parse::<TokenStoreKind>().is_err());
        assert_eq!(TokenStoreKind::File.to_string(), "file");
    }
}
