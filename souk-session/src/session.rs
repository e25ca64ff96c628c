//! The auth session state machine.
//!
//! ```text
//! Unknown ──initialize──▶ Authenticated ⇄ Unauthenticated
//!    └──────initialize──▶ Unauthenticated
//! ```
//!
//! Every public operation takes the session lock, so no two bootstrap,
//! refresh, login, or sign-out sequences interleave. Internal `*_locked`
//! helpers assume the lock is held and never take it again.

use std::sync::Arc;

use serde_json::json;
use souk_core::{ApiError, AuthState, Credentials, Request, TokenStore, UserProfile};
use souk_fetch::{RetryingClient, redact_url};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::endpoints::AuthRoutes;
use crate::error::SessionError;
use crate::parser::{parse_auth_response, parse_profile};
use crate::refresh::refresh_with_fallback;
use crate::report::{BootstrapOutcome, BootstrapReport};

// ============================================================================
// Auth Session
// ============================================================================

/// Owns auth state, the current user, and the persisted credential set.
pub struct AuthSession {
    client: RetryingClient,
    store: Arc<dyn TokenStore>,
    routes: AuthRoutes,
    state: watch::Sender<AuthState>,
    user: watch::Sender<Option<UserProfile>>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &self.state())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Creates a session in state [`AuthState::Unknown`].
    pub fn new(client: RetryingClient, store: Arc<dyn TokenStore>, routes: AuthRoutes) -> Self {
        Self {
            client,
            store,
            routes,
            state: watch::Sender::new(AuthState::Unknown),
            user: watch::Sender::new(None),
            lock: Mutex::new(()),
        }
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    /// Current auth state.
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Returns true if the state is [`AuthState::Authenticated`].
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Subscribes to auth state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The last parsed user, if any.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.user.borrow().clone()
    }

    /// Subscribes to user changes.
    pub fn subscribe_user(&self) -> watch::Receiver<Option<UserProfile>> {
        self.user.subscribe()
    }

    /// The underlying client.
    pub fn client(&self) -> &RetryingClient {
        &self.client
    }

    /// The resolved auth endpoints.
    pub fn routes(&self) -> &AuthRoutes {
        &self.routes
    }

    fn set_state(&self, next: AuthState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "Auth state changed");
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Resolves the initial state.
    ///
    /// With a stored token the state becomes Authenticated immediately and a
    /// bootstrap runs. Without one the state becomes Unauthenticated and no
    /// network call is made.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> BootstrapReport {
        let _guard = self.lock.lock().await;

        if self.store.has_tokens() {
            self.set_state(AuthState::Authenticated);
            self.bootstrap_locked().await
        } else {
            self.set_state(AuthState::Unauthenticated);
            BootstrapReport::no_session()
        }
    }

    /// Fetches the profile, refreshing the token once on a 401.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> BootstrapReport {
        let _guard = self.lock.lock().await;
        self.bootstrap_locked().await
    }

    /// Re-runs bootstrap if tokens exist; otherwise moves to Unauthenticated.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> BootstrapReport {
        let _guard = self.lock.lock().await;

        if !self.store.has_tokens() {
            self.user.send_replace(None);
            self.set_state(AuthState::Unauthenticated);
            return BootstrapReport::no_session();
        }

        self.set_state(AuthState::Authenticated);
        self.bootstrap_locked().await
    }

    /// Refreshes the token pair through the primary, then the proxy endpoint.
    ///
    /// Succeeds only if new credentials were parsed and persisted.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        self.refresh_locked().await
    }

    /// Clears every persisted field and the in-memory user.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let _guard = self.lock.lock().await;
        self.sign_out_locked();
    }

    // ------------------------------------------------------------------------
    // Sign-in
    // ------------------------------------------------------------------------

    /// Signs in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BootstrapReport, SessionError> {
        let body = json!({ "email": email, "password": password });
        self.authenticate(self.routes.login.clone(), body.to_string())
            .await
    }

    /// Creates an account and signs in.
    #[instrument(skip(self, password))]
    pub async fn register_with_email(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<BootstrapReport, SessionError> {
        let body = json!({
            "email": email,
            "password": password,
            "firstName": first_name,
            "lastName": last_name,
        });
        self.authenticate(self.routes.register.clone(), body.to_string())
            .await
    }

    /// Exchanges identity-provider tokens for a backend session.
    #[instrument(skip(self, access_token, id_token))]
    pub async fn exchange_identity_tokens(
        &self,
        access_token: &str,
        id_token: &str,
    ) -> Result<BootstrapReport, SessionError> {
        let body = json!({ "accessToken": access_token, "idToken": id_token });
        self.authenticate(self.routes.exchange.clone(), body.to_string())
            .await
    }

    async fn authenticate(&self, url: Url, body: String) -> Result<BootstrapReport, SessionError> {
        let _guard = self.lock.lock().await;

        let response = self
            .client
            .send(Request::post(url, body).without_auth())
            .await?;
        self.store_auth_response(&response, None)?;

        self.set_state(AuthState::Authenticated);
        Ok(self.bootstrap_locked().await)
    }

    // ------------------------------------------------------------------------
    // Locked internals
    // ------------------------------------------------------------------------

    async fn bootstrap_locked(&self) -> BootstrapReport {
        let mut report = BootstrapReport::new();
        let mut retried_after_refresh = false;

        'pass: loop {
            for url in &self.routes.profile {
                let endpoint = url.path().to_string();

                match self.client.get(url.clone()).await {
                    Ok(body) => {
                        report.record(&endpoint, None);
                        let outcome = if self.apply_profile(&body) {
                            BootstrapOutcome::ProfileLoaded
                        } else {
                            self.restore_cached_profile()
                        };
                        return report.finish(outcome);
                    }
                    Err(ApiError::Unauthorized) => {
                        report.record(&endpoint, Some(ApiError::Unauthorized));
                        if !retried_after_refresh {
                            retried_after_refresh = true;
                            report.refresh_attempts += 1;
                            match self.refresh_locked().await {
                                Ok(()) => {
                                    debug!("Token refreshed, retrying bootstrap");
                                    continue 'pass;
                                }
                                Err(err) => warn!(error = %err, "Token refresh failed"),
                            }
                        }
                        self.sign_out_locked();
                        return report.finish(BootstrapOutcome::SignedOut);
                    }
                    Err(err) => {
                        warn!(
                            endpoint = %redact_url(url),
                            kind = err.kind(),
                            error = %err,
                            "Profile endpoint failed"
                        );
                        report.record(&endpoint, Some(err));
                    }
                }
            }

            warn!("All profile endpoints failed; using cached profile if available");
            return report.finish(self.restore_cached_profile());
        }
    }

    async fn refresh_locked(&self) -> Result<(), SessionError> {
        let refresh_token = self
            .store
            .refresh_token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SessionError::MissingRefreshToken)?;

        let body = json!({ "refresh_token": refresh_token }).to_string();
        let primary = Request::post(self.routes.refresh.clone(), body.clone()).without_auth();
        let fallback = Request::post(self.routes.proxy_refresh.clone(), body).without_auth();

        refresh_with_fallback(
            || self.client.send(primary),
            || self.client.send(fallback),
            |response| self.store_auth_response(response, Some(refresh_token.clone())),
        )
        .await?;

        info!("Tokens refreshed");
        Ok(())
    }

    fn sign_out_locked(&self) {
        debug!("Signing out");
        if let Err(err) = self.store.clear_all() {
            warn!(error = %err, "Failed to clear token store");
        }
        self.user.send_replace(None);
        self.set_state(AuthState::Unauthenticated);
    }

    /// Parses an auth envelope and persists its tokens.
    ///
    /// `keep_refresh` is used when the response omits a refresh token.
    fn store_auth_response(
        &self,
        body: &str,
        keep_refresh: Option<String>,
    ) -> Result<Credentials, SessionError> {
        let payload = parse_auth_response(body)?;
        let credentials = payload.credentials.or_refresh_token(keep_refresh);
        self.store.store_credentials(&credentials)?;

        if let Some(user) = payload.user {
            self.apply_profile(&user);
        }
        Ok(credentials)
    }

    /// Parses a profile, publishes it, and caches the raw payload.
    fn apply_profile(&self, body: &str) -> bool {
        let profile = match parse_profile(body) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "Failed to parse profile");
                return false;
            }
        };

        if !profile.id.trim().is_empty() {
            if let Err(err) = self.store.set_user_id(&profile.id) {
                warn!(error = %err, "Failed to persist user id");
            }
        }
        if let Err(err) = self.store.set_cached_profile(body) {
            warn!(error = %err, "Failed to cache profile");
        }

        debug!(user = %profile.display_name(), "User set");
        self.user.send_replace(Some(profile));
        true
    }

    /// Restores the cached profile, keeping the in-memory user if none parses.
    fn restore_cached_profile(&self) -> BootstrapOutcome {
        let cached = self
            .store
            .cached_profile()
            .and_then(|body| parse_profile(&body).ok());

        match cached {
            Some(profile) => {
                self.user.send_replace(Some(profile));
                BootstrapOutcome::CachedProfile
            }
            None if self.user.borrow().is_some() => BootstrapOutcome::CachedProfile,
            None => BootstrapOutcome::NoProfile,
        }
    }
}
