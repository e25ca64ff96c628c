//! End-to-end tests for the auth session over a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use souk_core::{ApiError, AuthState, Credentials, HttpMethod, TokenSource, TokenStore};
use souk_fetch::testing::ScriptedTransport;
use souk_fetch::{RequestExecutor, RetryPolicy, RetryingClient, TransportError};
use souk_session::{ApiEndpoints, AuthRoutes, AuthSession, BootstrapOutcome, SessionError};
use souk_store::{AuthConfig, MemoryTokenStore};

const ME: &str = "/v1/account/me";
const USERS_PROFILE: &str = "/v1/users/get/profile";
const USER_PROFILE: &str = "/v1/user/get/profile";
const REFRESH: &str = "/v1/auth/refresh-token";
const PROXY_REFRESH: &str = "/api/proxy/auth/refresh-token";
const LOGIN: &str = "/v1/auth/login/email";
const REGISTER: &str = "/v1/auth/signup/email";
const EXCHANGE: &str = "/v1/auth/auth0/callback";

const OLD_TOKEN: &str = "old.token.sig";
const NEW_TOKEN: &str = "new.token.sig";
const PROFILE: &str = r#"{"data":{"_id":"u1","email":"ann@example.com","firstName":"Ann"}}"#;

struct Harness {
    transport: Arc<ScriptedTransport>,
    store: Arc<MemoryTokenStore>,
    session: AuthSession,
}

fn harness(store: MemoryTokenStore) -> Harness {
    harness_with(store, ScriptedTransport::new())
}

fn harness_with(store: MemoryTokenStore, transport: ScriptedTransport) -> Harness {
    let transport = Arc::new(transport);
    let store = Arc::new(store);
    let executor = RequestExecutor::new(transport.clone(), store.clone());
    let client = RetryingClient::new(Arc::new(executor), RetryPolicy::default());
    let endpoints = ApiEndpoints::new("api.example.com", "www.example.com").unwrap();
    let routes = AuthRoutes::new(&endpoints, &AuthConfig::default());
    let session = AuthSession::new(client, store.clone(), routes);

    Harness {
        transport,
        store,
        session,
    }
}

fn signed_in_store() -> MemoryTokenStore {
    MemoryTokenStore::with_credentials(
        &Credentials::new(OLD_TOKEN, Some("refresh-1".to_string())).unwrap(),
    )
}

fn token_envelope(access: &str, refresh: Option<&str>) -> String {
    match refresh {
        Some(refresh) => format!(
            r#"{{"success":true,"data":{{"accessToken":"{access}","refreshToken":"{refresh}"}}}}"#
        ),
        None => format!(r#"{{"success":true,"data":{{"accessToken":"{access}"}}}}"#),
    }
}

fn body_json(body: Option<&str>) -> serde_json::Value {
    serde_json::from_str(body.unwrap()).unwrap()
}

// ============================================================================
// initialize / sign_out
// ============================================================================

#[tokio::test(start_paused = true)]
async fn initialize_without_token_makes_no_network_call() {
    let h = harness(MemoryTokenStore::new());
    assert_eq!(h.session.state(), AuthState::Unknown);

    let report = h.session.initialize().await;

    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert_eq!(report.outcome, BootstrapOutcome::NoSession);
    assert!(h.transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn initialize_with_token_loads_profile() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);

    let report = h.session.initialize().await;

    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    assert_eq!(report.refresh_attempts, 0);
    let user = h.session.current_user().unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.display_name(), "Ann");
    assert_eq!(h.store.user_id().as_deref(), Some("u1"));
    assert_eq!(h.store.cached_profile().as_deref(), Some(PROFILE));
    assert_eq!(
        h.transport.calls()[0].header("authorization"),
        Some("Bearer old.token.sig")
    );
}

#[tokio::test(start_paused = true)]
async fn sign_out_clears_everything_then_initialize_stays_offline() {
    let h = harness(signed_in_store());
    h.store.set_user_id("u1").unwrap();
    h.store.set_cached_profile(PROFILE).unwrap();

    h.session.sign_out().await;

    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert!(h.session.current_user().is_none());
    assert_eq!(h.store.access_token(), None);
    assert_eq!(h.store.refresh_token(), None);
    assert_eq!(h.store.user_id(), None);
    assert_eq!(h.store.cached_profile(), None);

    h.session.initialize().await;

    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert!(h.transport.calls().is_empty());
}

// ============================================================================
// bootstrap
// ============================================================================

#[tokio::test(start_paused = true)]
async fn unauthorized_once_then_refresh_succeeds() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 401, "");
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);
    h.transport
        .respond(HttpMethod::Post, REFRESH, 200, &token_envelope(NEW_TOKEN, Some("refresh-2")));

    let report = h.session.initialize().await;

    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    assert_eq!(report.refresh_attempts, 1);
    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 1);
    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 0);
    assert_eq!(h.store.access_token().as_deref(), Some(NEW_TOKEN));
    assert_eq!(h.store.refresh_token().as_deref(), Some("refresh-2"));
    assert_eq!(h.store.cached_profile().as_deref(), Some(PROFILE));

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].header("authorization"), None);
    assert_eq!(body_json(calls[1].body.as_deref())["refresh_token"], "refresh-1");
    assert_eq!(calls[2].header("authorization"), Some("Bearer new.token.sig"));
}

#[tokio::test(start_paused = true)]
async fn unauthorized_after_refresh_signs_out_without_second_refresh() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 401, "");
    h.transport
        .respond(HttpMethod::Post, REFRESH, 200, &token_envelope(NEW_TOKEN, None));

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::SignedOut);
    assert_eq!(report.refresh_attempts, 1);
    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert_eq!(h.transport.call_count(HttpMethod::Get, ME), 2);
    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 1);
    assert!(!h.store.has_tokens());
}

#[tokio::test(start_paused = true)]
async fn unauthorized_with_failed_refresh_signs_out() {
    let h = harness(signed_in_store());
    h.store.set_cached_profile(PROFILE).unwrap();
    h.transport.respond(HttpMethod::Get, ME, 401, "");
    h.transport.respond(HttpMethod::Post, REFRESH, 401, "");
    h.transport.respond(HttpMethod::Post, PROXY_REFRESH, 500, "");

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::SignedOut);
    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 1);
    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 1);
    assert_eq!(h.store.cached_profile(), None);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_without_refresh_token_signs_out() {
    let h = harness(MemoryTokenStore::with_credentials(
        &Credentials::new(OLD_TOKEN, None).unwrap(),
    ));
    h.transport.respond(HttpMethod::Get, ME, 401, "");

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::SignedOut);
    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 0);
}

#[tokio::test(start_paused = true)]
async fn non_auth_failures_fall_back_to_cache_and_keep_session() {
    let h = harness(signed_in_store());
    h.store.set_cached_profile(PROFILE).unwrap();
    h.transport.respond(HttpMethod::Get, ME, 503, "");
    h.transport.respond(HttpMethod::Get, USERS_PROFILE, 500, r#"{"message":"boom"}"#);
    h.transport.fail(HttpMethod::Get, USER_PROFILE, TransportError::Timeout);

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::CachedProfile);
    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert_eq!(h.store.access_token().as_deref(), Some(OLD_TOKEN));
    assert_eq!(h.session.current_user().unwrap().id, "u1");

    let errors: Vec<_> = report.attempts.iter().map(|a| a.error.clone()).collect();
    assert_eq!(
        errors,
        [
            Some(ApiError::ServiceUnavailable),
            Some(ApiError::server("boom")),
            Some(ApiError::Timeout),
        ]
    );
    assert_eq!(h.transport.call_count(HttpMethod::Get, USER_PROFILE), 3);
}

#[tokio::test(start_paused = true)]
async fn non_auth_failures_without_cache_keep_session() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 503, "");

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::NoProfile);
    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert!(h.session.current_user().is_none());
}

#[tokio::test(start_paused = true)]
async fn later_endpoint_serves_profile() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 404, "");
    h.transport.respond(HttpMethod::Get, USERS_PROFILE, 200, r#"{"user":{"id":"u2"}}"#);

    let report = h.session.initialize().await;

    assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    assert_eq!(report.attempts.len(), 2);
    assert!(report.attempts[1].succeeded());
    assert_eq!(h.session.current_user().unwrap().id, "u2");
    assert_eq!(h.transport.call_count(HttpMethod::Get, USER_PROFILE), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_profile_without_tokens_clears_user() {
    let h = harness(MemoryTokenStore::new());

    let report = h.session.refresh_profile().await;

    assert_eq!(report.outcome, BootstrapOutcome::NoSession);
    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert!(h.session.current_user().is_none());
}

#[tokio::test(start_paused = true)]
async fn refresh_profile_forces_authenticated() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);

    h.session.refresh_profile().await;

    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert_eq!(h.session.current_user().unwrap().email.as_deref(), Some("ann@example.com"));
}

// ============================================================================
// refresh_token
// ============================================================================

#[tokio::test(start_paused = true)]
async fn unparseable_primary_refresh_uses_fallback_once() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Post, REFRESH, 200, r#"{"success":true}"#);
    h.transport
        .respond(HttpMethod::Post, PROXY_REFRESH, 200, &token_envelope(NEW_TOKEN, None));

    h.session.refresh_token().await.unwrap();

    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 1);
    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 1);
    assert_eq!(h.store.access_token().as_deref(), Some(NEW_TOKEN));
    assert_eq!(h.store.refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test(start_paused = true)]
async fn html_primary_refresh_uses_fallback() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Post, REFRESH, 200, "<!doctype html><p>proxy</p>");
    h.transport
        .respond(HttpMethod::Post, PROXY_REFRESH, 200, &token_envelope(NEW_TOKEN, Some("r2")));

    h.session.refresh_token().await.unwrap();

    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 1);
    assert_eq!(h.store.refresh_token().as_deref(), Some("r2"));
}

#[tokio::test(start_paused = true)]
async fn failed_fallback_is_final() {
    let h = harness(signed_in_store());
    h.transport.respond(HttpMethod::Post, REFRESH, 500, "");
    h.transport.respond(HttpMethod::Post, PROXY_REFRESH, 200, r#"{"success":false}"#);

    let result = h.session.refresh_token().await;

    assert!(matches!(result, Err(SessionError::InvalidResponse(_))));
    assert_eq!(h.store.access_token().as_deref(), Some(OLD_TOKEN));
}

#[tokio::test(start_paused = true)]
async fn successful_primary_refresh_never_calls_fallback() {
    let h = harness(signed_in_store());
    h.transport
        .respond(HttpMethod::Post, REFRESH, 200, &token_envelope(NEW_TOKEN, Some("refresh-2")));

    h.session.refresh_token().await.unwrap();

    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 0);
    assert_eq!(h.store.refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test(start_paused = true)]
async fn refresh_without_refresh_token_fails_offline() {
    let h = harness(MemoryTokenStore::new());

    let result = h.session.refresh_token().await;

    assert!(matches!(result, Err(SessionError::MissingRefreshToken)));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn refresh_write_is_never_retried() {
    let h = harness(signed_in_store());
    h.transport.fail(HttpMethod::Post, REFRESH, TransportError::Timeout);
    h.transport.fail(HttpMethod::Post, PROXY_REFRESH, TransportError::Timeout);

    let result = h.session.refresh_token().await;

    assert!(matches!(result, Err(SessionError::Api(ApiError::Timeout))));
    assert_eq!(h.transport.call_count(HttpMethod::Post, REFRESH), 1);
    assert_eq!(h.transport.call_count(HttpMethod::Post, PROXY_REFRESH), 1);
    assert_eq!(h.store.access_token().as_deref(), Some(OLD_TOKEN));
}

// ============================================================================
// sign-in
// ============================================================================

#[tokio::test(start_paused = true)]
async fn login_persists_tokens_and_bootstraps() {
    let h = harness(MemoryTokenStore::new());
    h.transport.respond(
        HttpMethod::Post,
        LOGIN,
        200,
        r#"{"status":true,"data":{"access_token":"new.token.sig","refresh_token":"r9","user":{"_id":"u1","firstName":"Ann","lastName":"Lee"}}}"#,
    );
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);
    let mut states = h.session.subscribe_state();

    let report = h.session.login_with_email("ann@example.com", "pw").await.unwrap();

    assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), AuthState::Authenticated);
    assert_eq!(h.store.access_token().as_deref(), Some(NEW_TOKEN));
    assert_eq!(h.store.refresh_token().as_deref(), Some("r9"));

    let calls = h.transport.calls();
    assert_eq!(calls[0].header("authorization"), None);
    let body = body_json(calls[0].body.as_deref());
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["password"], "pw");
    assert_eq!(calls[1].header("authorization"), Some("Bearer new.token.sig"));
}

#[tokio::test(start_paused = true)]
async fn login_with_malformed_token_is_rejected() {
    let h = harness(MemoryTokenStore::new());
    h.transport
        .respond(HttpMethod::Post, LOGIN, 200, &token_envelope("not-a-jwt", Some("r")));

    let result = h.session.login_with_email("a@b.c", "pw").await;

    assert!(matches!(result, Err(SessionError::InvalidTokenShape)));
    assert_ne!(h.session.state(), AuthState::Authenticated);
    assert!(!h.store.has_tokens());
    assert_eq!(h.transport.call_count(HttpMethod::Get, ME), 0);
}

#[tokio::test(start_paused = true)]
async fn login_failure_surfaces_classified_error() {
    let h = harness(MemoryTokenStore::new());
    h.transport
        .respond(HttpMethod::Post, LOGIN, 400, r#"{"message":"Invalid email or password"}"#);

    let err = h.session.login_with_email("a@b.c", "bad").await.unwrap_err();

    assert_eq!(err.api_error(), Some(&ApiError::server("Invalid email or password")));
    assert_eq!(err.user_message(), "Invalid email or password");
}

#[tokio::test(start_paused = true)]
async fn register_sends_names() {
    let h = harness(MemoryTokenStore::new());
    h.transport
        .respond(HttpMethod::Post, REGISTER, 200, &token_envelope(NEW_TOKEN, Some("r")));
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);

    h.session
        .register_with_email("ann@example.com", "pw", "Ann", "Lee")
        .await
        .unwrap();

    let body = body_json(h.transport.calls()[0].body.as_deref());
    assert_eq!(body["firstName"], "Ann");
    assert_eq!(body["lastName"], "Lee");
    assert!(h.session.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn identity_exchange_sends_both_tokens() {
    let h = harness(MemoryTokenStore::new());
    h.transport
        .respond(HttpMethod::Post, EXCHANGE, 200, &token_envelope(NEW_TOKEN, Some("r")));
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);

    h.session
        .exchange_identity_tokens("idp-access", "idp-id")
        .await
        .unwrap();

    let body = body_json(h.transport.calls()[0].body.as_deref());
    assert_eq!(body["accessToken"], "idp-access");
    assert_eq!(body["idToken"], "idp-id");
    assert_eq!(h.session.state(), AuthState::Authenticated);
}

// ============================================================================
// concurrent operations
// ============================================================================

fn slow_harness(store: MemoryTokenStore) -> Arc<Harness> {
    Arc::new(harness_with(
        store,
        ScriptedTransport::new().with_latency(Duration::from_millis(20)),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initialize_and_refresh_run_one_after_another() {
    let h = slow_harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 401, "");
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);
    h.transport
        .respond(HttpMethod::Post, REFRESH, 200, &token_envelope(NEW_TOKEN, Some("refresh-2")));

    let init = tokio::spawn({
        let h = Arc::clone(&h);
        async move { h.session.initialize().await }
    });
    let refresh = tokio::spawn({
        let h = Arc::clone(&h);
        async move { h.session.refresh_token().await }
    });
    let report = init.await.unwrap();
    refresh.await.unwrap().unwrap();

    // Whichever runs first, each refresh sees the token the previous one stored.
    let calls = h.transport.calls();
    let refresh_tokens: Vec<_> = calls
        .iter()
        .filter(|call| call.url.path() == REFRESH)
        .map(|call| body_json(call.body.as_deref())["refresh_token"].clone())
        .collect();
    assert_eq!(refresh_tokens, ["refresh-1", "refresh-2"]);
    assert!(calls.windows(2).all(|pair| pair[0].method != pair[1].method));

    assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    assert_eq!(report.refresh_attempts, 1);
    assert_eq!(h.transport.call_count(HttpMethod::Get, ME), 2);

    assert_eq!(h.session.state(), AuthState::Authenticated);
    assert_eq!(h.store.access_token().as_deref(), Some(NEW_TOKEN));
    assert_eq!(h.store.refresh_token().as_deref(), Some("refresh-2"));
    assert_eq!(h.session.current_user().map(|user| user.id).as_deref(), Some("u1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sign_out_and_initialize_end_signed_out() {
    let h = slow_harness(signed_in_store());
    h.transport.respond(HttpMethod::Get, ME, 200, PROFILE);

    let sign_out = tokio::spawn({
        let h = Arc::clone(&h);
        async move { h.session.sign_out().await }
    });
    let init = tokio::spawn({
        let h = Arc::clone(&h);
        async move { h.session.initialize().await }
    });
    let report = init.await.unwrap();
    sign_out.await.unwrap();

    if report.outcome == BootstrapOutcome::NoSession {
        assert!(h.transport.calls().is_empty());
    } else {
        assert_eq!(report.outcome, BootstrapOutcome::ProfileLoaded);
    }
    assert_eq!(h.session.state(), AuthState::Unauthenticated);
    assert!(h.session.current_user().is_none());
    assert_eq!(h.store.access_token(), None);
    assert_eq!(h.store.refresh_token(), None);
    assert_eq!(h.store.cached_profile(), None);
}
