//! Auth and profile response parsers.
//!
//! Both parsers are tolerant: they accept the envelope shapes the backend
//! has used over time and never panic on malformed input.

use serde_json::{Map, Value};
use souk_core::{Credentials, UserProfile};
use tracing::{debug, warn};

use crate::error::SessionError;

// ============================================================================
// Helpers
// ============================================================================

fn parse_object(body: &str) -> Result<Map<String, Value>, SessionError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(SessionError::InvalidResponse("expected a JSON object".to_string())),
        Err(e) => Err(SessionError::InvalidResponse(format!("invalid JSON: {e}"))),
    }
}

/// Returns the first key holding a string (or a number, as text).
fn first_string(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// ============================================================================
// Auth Envelope
// ============================================================================

/// Tokens and optional user extracted from an auth response.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    /// Validated token pair.
    pub credentials: Credentials,
    /// Embedded `user` object, serialized back to JSON.
    pub user: Option<String>,
}

/// Parses a login, registration, exchange, or refresh response.
///
/// Expects `{ "success" | "status": true, "data": { ... } }`, where `data`
/// may be omitted and the fields sit at the root. Tokens are read from
/// `accessToken`/`access_token` and `refreshToken`/`refresh_token`.
pub fn parse_auth_response(body: &str) -> Result<AuthPayload, SessionError> {
    let root = parse_object(body)?;

    if !is_true(root.get("success")) && !is_true(root.get("status")) {
        warn!("Auth response indicates failure");
        return Err(SessionError::InvalidResponse(
            "response is not marked successful".to_string(),
        ));
    }

    let data = match root.get("data") {
        Some(Value::Object(data)) => data,
        _ => &root,
    };

    let access_token = first_string(data, &["accessToken", "access_token"])
        .ok_or_else(|| SessionError::InvalidResponse("no access token".to_string()))?;
    let refresh_token = first_string(data, &["refreshToken", "refresh_token"]);

    let credentials = Credentials::new(access_token, refresh_token).map_err(|_| {
        warn!("Invalid access token shape");
        SessionError::InvalidTokenShape
    })?;

    let user = match data.get("user") {
        Some(user @ Value::Object(_)) => Some(user.to_string()),
        _ => None,
    };

    debug!(
        has_refresh_token = credentials.refresh_token().is_some(),
        has_user = user.is_some(),
        "Auth response parsed"
    );
    Ok(AuthPayload { credentials, user })
}

// ============================================================================
// Profile
// ============================================================================

/// Parses a profile response.
///
/// The user object is looked up under `data`, then `user`, then the root.
pub fn parse_profile(body: &str) -> Result<UserProfile, SessionError> {
    let root = parse_object(body)?;

    let user = match (root.get("data"), root.get("user")) {
        (Some(Value::Object(data)), _) => data,
        (_, Some(Value::Object(user))) => user,
        _ => &root,
    };

    Ok(UserProfile {
        id: first_string(user, &["_id", "id"]).unwrap_or_default(),
        email: first_string(user, &["email"]),
        first_name: first_string(user, &["firstName", "first_name"]),
        last_name: first_string(user, &["lastName", "last_name"]),
        profile_image: first_string(user, &["profileImage", "profile_image", "avatar"]),
        phone: first_string(user, &["phone"]),
    })
}

// ============================================================================
// Tests
// ============================================================================
