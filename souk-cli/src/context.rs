//! Wires configuration, token store, client, and session together.

use std::path::PathBuf;

use anyhow::{Context, Result};
use souk_fetch::RetryingClient;
use souk_session::{ApiEndpoints, AuthRoutes, AuthSession};
use souk_store::{Config, TokenStoreHandle, open_token_store};
use tracing::debug;
use url::Url;

use crate::Cli;

/// Everything a command needs to talk to the backend.
pub struct AppContext {
    pub endpoints: ApiEndpoints,
    pub session: AuthSession,
}

impl AppContext {
    /// Loads and validates configuration, then builds the object graph.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = config_path(cli);
        let mut config = Config::load_with_env(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        if let Some(kind) = cli.store {
            config.general.token_store = kind;
        }

        Self::from_config(&config)
    }

    /// Builds the object graph from an already-loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let TokenStoreHandle { store, source } =
            open_token_store(config.general.token_store, None)
                .context("Failed to open token store")?;

        let client = RetryingClient::from_settings(&config.client_settings(), source)
            .context("Failed to build HTTP client")?;
        let endpoints = ApiEndpoints::from_config(&config.api)?;
        let routes = AuthRoutes::new(&endpoints, &config.auth);

        debug!(
            api = %endpoints.api_base(),
            store = %config.general.token_store,
            "Context ready"
        );

        Ok(Self {
            session: AuthSession::new(client, store, routes),
            endpoints,
        })
    }

    /// The shared client.
    pub fn client(&self) -> &RetryingClient {
        self.session.client()
    }

    /// Resolves a command-line target to a URL.
    ///
    /// Absolute `http(s)` URLs pass through; anything else is a path under
    /// the API base.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        resolve_target(&self.endpoints, target)
    }
}

/// The configuration file the CLI reads.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}

/// Log level from the config file, or `warn` if it cannot be read.
pub fn configured_log_level(cli: &Cli) -> String {
    Config::load_from(&config_path(cli))
        .map(|config| config.general.log_level)
        .unwrap_or_else(|_| "warn".to_string())
}

pub(crate) fn resolve_target(endpoints: &ApiEndpoints, target: &str) -> Result<Url> {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        return Url::parse(target).with_context(|| format!("Invalid URL: {target}"));
    }

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let mut url = endpoints.api_url(&[path]);
    if !query.is_empty() {
        url.set_query(Some(query));
    }
    Ok(url)
}
