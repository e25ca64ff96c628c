//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use souk_core::{ApiError, AuthState, UserProfile};
use souk_session::{BootstrapReport, SessionError};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for session commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub state: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptOutput>,
    pub refresh_attempts: u32,
}

/// One profile endpoint call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput {
    pub endpoint: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A command failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u32>,
}

impl SessionOutput {
    /// Builds the output from the session state and an optional report.
    pub fn new(state: AuthState, user: Option<UserProfile>, report: Option<&BootstrapReport>) -> Self {
        Self {
            state: format!("{state:?}").to_lowercase(),
            authenticated: state.is_authenticated(),
            outcome: report.map(|r| r.outcome.label().to_string()),
            user,
            attempts: report
                .map(|r| {
                    r.attempts
                        .iter()
                        .map(|a| AttemptOutput {
                            endpoint: a.endpoint.clone(),
                            ok: a.succeeded(),
                            error: a.error.as_ref().map(|e| e.kind().to_string()),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            refresh_attempts: report.map_or(0, |r| r.refresh_attempts),
        }
    }
}

impl ErrorOutput {
    /// Describes an error, using the classified kind when there is one.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let api = error.downcast_ref::<ApiError>().or_else(|| {
            error
                .downcast_ref::<SessionError>()
                .and_then(SessionError::api_error)
        });

        match api {
            Some(api) => Self {
                error: api.friendly_message(),
                kind: api.kind().to_string(),
                retry_after_seconds: match api {
                    ApiError::RateLimited {
                        retry_after_seconds,
                    } => *retry_after_seconds,
                    _ => None,
                },
            },
            None => Self {
                error: format!("{error:#}"),
                kind: "error".to_string(),
                retry_after_seconds: None,
            },
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a response body.
    ///
    /// JSON bodies are re-encoded (pretty if requested); anything else is
    /// wrapped as `{"body": "..."}`.
    pub fn format_body(&self, body: &str) -> Result<String> {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => self.format(&value),
            Err(_) => self.format(&serde_json::json!({ "body": body })),
        }
    }
}
