//! Bootstrap outcome reporting.

use std::fmt;

use souk_core::ApiError;

/// How a bootstrap ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A profile endpoint answered and the profile was parsed.
    ProfileLoaded,
    /// Every endpoint failed without a 401; the cached profile was restored.
    CachedProfile,
    /// Every endpoint failed without a 401 and nothing was cached.
    NoProfile,
    /// A 401 survived the single refresh attempt.
    SignedOut,
    /// No token was stored, so nothing was attempted.
    NoSession,
}

impl BootstrapOutcome {
    /// Short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProfileLoaded => "profile_loaded",
            Self::CachedProfile => "cached_profile",
            Self::NoProfile => "no_profile",
            Self::SignedOut => "signed_out",
            Self::NoSession => "no_session",
        }
    }
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One profile endpoint call.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointAttempt {
    /// Endpoint path.
    pub endpoint: String,
    /// The classified failure, or `None` on success.
    pub error: Option<ApiError>,
}

impl EndpointAttempt {
    /// Returns true if the call succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What a bootstrap did, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    /// Final outcome.
    pub outcome: BootstrapOutcome,
    /// Every profile endpoint call, across both passes.
    pub attempts: Vec<EndpointAttempt>,
    /// Number of token refreshes attempted (0 or 1).
    pub refresh_attempts: u32,
}

impl BootstrapReport {
    pub(crate) fn new() -> Self {
        Self {
            outcome: BootstrapOutcome::NoProfile,
            attempts: Vec::new(),
            refresh_attempts: 0,
        }
    }

    pub(crate) fn no_session() -> Self {
        Self {
            outcome: BootstrapOutcome::NoSession,
            ..Self::new()
        }
    }

    pub(crate) fn record(&mut self, endpoint: &str, error: Option<ApiError>) {
        self.attempts.push(EndpointAttempt {
            endpoint: endpoint.to_string(),
            error,
        });
    }

    pub(crate) fn finish(mut self, outcome: BootstrapOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}
