//! Endpoint URL building.
//!
//! Base URLs are normalized once at startup:
//!
//! - A missing scheme becomes `https://`
//! - Trailing slashes are removed
//! - The API base ends in `/v1` exactly once; the frontend base never gets it
//!
//! Relative paths are split on `/` and blank segments dropped, so
//! `"auth/refresh-token"` and `["auth", "refresh-token"]` build the same URL.

use souk_core::CoreError;
use souk_store::{ApiConfig, AuthConfig};
use url::Url;

const API_VERSION_SEGMENT: &str = "v1";

// ============================================================================
// Normalization
// ============================================================================

fn with_scheme(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    url.trim_end_matches('/').to_string()
}

fn parse_base(raw: &str, normalized: &str) -> Result<Url, CoreError> {
    let url = Url::parse(normalized)
        .map_err(|e| CoreError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(CoreError::InvalidUrl(format!("{raw}: not a base URL")));
    }
    Ok(url)
}

/// Normalizes the API base URL and appends `/v1` exactly once.
pub fn normalize_api_url(raw: &str) -> Result<Url, CoreError> {
    let mut normalized = with_scheme(raw);
    if let Some(stripped) = normalized.strip_suffix("/v1") {
        normalized = stripped.to_string();
    }
    let mut url = parse_base(raw, &normalized)?;
    push_segments(&mut url, &[API_VERSION_SEGMENT]);
    Ok(url)
}

/// Normalizes the frontend base URL. No version segment is added.
pub fn normalize_frontend_url(raw: &str) -> Result<Url, CoreError> {
    parse_base(raw, &with_scheme(raw))
}

fn push_segments(url: &mut Url, segments: &[&str]) {
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        for segment in segments {
            path.extend(segment.split('/').filter(|part| !part.trim().is_empty()));
        }
    }
}

// ============================================================================
// Api Endpoints
// ============================================================================

/// Normalized base URLs for the API and the web frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    api_base: Url,
    frontend_base: Url,
}

impl ApiEndpoints {
    /// Normalizes both base URLs.
    pub fn new(backend_url: &str, frontend_url: &str) -> Result<Self, CoreError> {
        Ok(Self {
            api_base: normalize_api_url(backend_url)?,
            frontend_base: normalize_frontend_url(frontend_url)?,
        })
    }

    /// Builds endpoints from the `api` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, CoreError> {
        Self::new(&config.backend_url, &config.frontend_url)
    }

    /// The API base, ending in `/v1`.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// The frontend base.
    pub fn frontend_base(&self) -> &Url {
        &self.frontend_base
    }

    /// Builds an API URL from path segments.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        push_segments(&mut url, segments);
        url
    }

    /// Builds an API URL with query parameters. `None` values are skipped.
    pub fn api_url_with_query(&self, segments: &[&str], query: &[(&str, Option<&str>)]) -> Url {
        let mut url = self.api_url(segments);
        let present: Vec<_> = query
            .iter()
            .filter_map(|(name, value)| value.map(|v| (*name, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        url
    }

    /// Builds a frontend URL from path segments.
    pub fn frontend_url(&self, segments: &[&str]) -> Url {
        let mut url = self.frontend_base.clone();
        push_segments(&mut url, segments);
        url
    }
}

// ============================================================================
// Auth Routes
// ============================================================================

/// Resolved URLs of every endpoint the auth session calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRoutes {
    /// Profile endpoints, tried in order.
    pub profile: Vec<Url>,
    /// Primary token refresh.
    pub refresh: Url,
    /// Fallback token refresh through the frontend proxy.
    pub proxy_refresh: Url,
    /// Identity-provider token exchange.
    pub exchange: Url,
    /// Email/password login.
    pub login: Url,
    /// Email/password registration.
    pub register: Url,
}

impl AuthRoutes {
    /// Resolves the configured paths against the base URLs.
    pub fn new(endpoints: &ApiEndpoints, paths: &AuthConfig) -> Self {
        Self {
            profile: paths
                .profile_paths
                .iter()
                .filter(|path| !path.trim().is_empty())
                .map(|path| endpoints.api_url(&[path.as_str()]))
                .collect(),
            refresh: endpoints.api_url(&[paths.refresh_path.as_str()]),
            proxy_refresh: endpoints.frontend_url(&[paths.proxy_refresh_path.as_str()]),
            exchange: endpoints.api_url(&[paths.exchange_path.as_str()]),
            login: endpoints.api_url(&[paths.login_path.as_str()]),
            register: endpoints.api_url(&[paths.register_path.as_str()]),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_gets_v1_once() {
        for raw in [
            "api.example.com",
            "https://api.example.com",
            "https://api.example.com/",
            "https://api.example.com/v1",
            "https://api.example.com/v1///",
            "  https://api.example.com/v1  ",
        ] {
            assert_eq!(
                normalize_api_url(raw).unwrap().as_str(),
                "https://api.example.com/v1",
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_api_url_keeps_http_and_prefix() {
        assert_eq!(
            normalize_api_url("http://localhost:4000/backend/").unwrap().as_str(),
            "http://localhost:4000/backend/v1"
        );
    }

    #[test]
    fn test_frontend_url_has_no_version() {
        assert_eq!(
            normalize_frontend_url("www.example.com/").unwrap().as_str(),
            "https://www.example.com/"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(normalize_api_url("https://"), Err(CoreError::InvalidUrl(_))));
        assert!(normalize_frontend_url("   ").is_err());
    }

    #[test]
    fn test_segments_are_split_and_blank_dropped() {
        let endpoints = ApiEndpoints::new("api.example.com", "example.com").unwrap();

        assert_eq!(
            endpoints.api_url(&["users/get/profile"]).as_str(),
            "https://api.example.com/v1/users/get/profile"
        );
        assert_eq!(
            endpoints.api_url(&["/account/", "", "me"]).as_str(),
            "https://api.example.com/v1/account/me"
        );
        assert_eq!(
            endpoints.frontend_url(&["api", "proxy/auth/refresh-token"]).as_str(),
            "https://example.com/api/proxy/auth/refresh-token"
        );
    }

    #[test]
    fn test_query_skips_missing_values() {
        let endpoints = ApiEndpoints::new("api.example.com", "example.com").unwrap();
        let url = endpoints.api_url_with_query(&["listings"], &[("q", Some("tent")), ("page", None)]);
        assert_eq!(url.as_str(), "https://api.example.com/v1/listings?q=tent");
    }

    #[test]
    fn test_default_routes() {
        let endpoints = ApiEndpoints::new("api.example.com", "www.example.com").unwrap();
        let routes = AuthRoutes::new(&endpoints, &AuthConfig::default());

        let profile: Vec<_> = routes.profile.iter().map(Url::path).collect();
        assert_eq!(
            profile,
            ["/v1/account/me", "/v1/users/get/profile", "/v1/user/get/profile"]
        );
        assert_eq!(routes.refresh.as_str(), "https://api.example.com/v1/auth/refresh-token");
        assert_eq!(
            routes.proxy_refresh.as_str(),
            "https://www.example.com/api/proxy/auth/refresh-token"
        );
        assert_eq!(routes.exchange.path(), "/v1/auth/auth0/callback");
        assert_eq!(routes.login.path(), "/v1/auth/login/email");
        assert_eq!(routes.register.path(), "/v1/auth/signup/email");
    }
}
