//! Text output formatting with colors.

use souk_core::{ApiError, AuthState, UserProfile};
use souk_session::{BootstrapOutcome, BootstrapReport, SessionError};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the session state, user, and bootstrap outcome.
    pub fn format_session(
        &self,
        state: AuthState,
        user: Option<&UserProfile>,
        report: Option<&BootstrapReport>,
    ) -> String {
        let mut lines = Vec::new();

        let state_text = match state {
            AuthState::Authenticated => self.green(state.label()),
            AuthState::Unauthenticated => self.yellow(state.label()),
            AuthState::Unknown => self.dim(state.label()),
        };
        lines.push(format!("{:<10} {}", self.bold("Session"), state_text));

        if let Some(user) = user {
            lines.extend(self.format_profile(user));
        }

        if let Some(report) = report {
            lines.push(format!(
                "{:<10} {}",
                self.bold("Profile"),
                self.outcome_text(report.outcome)
            ));
            if report.refresh_attempts > 0 {
                lines.push(format!("{:<10} refreshed once", self.bold("Token")));
            }
            for attempt in report.attempts.iter().filter(|a| !a.succeeded()) {
                let kind = attempt.error.as_ref().map_or("ok", ApiError::kind);
                lines.push(self.dim(&format!("  {} - {kind}", attempt.endpoint)));
            }
        }

        lines.join("\n")
    }

    /// Formats the fields of a profile, one per line.
    pub fn format_profile(&self, user: &UserProfile) -> Vec<String> {
        let mut lines = vec![format!("{:<10} {}", self.bold("User"), user.display_name())];
        let fields = [
            ("Id", (!user.id.is_empty()).then_some(user.id.as_str())),
            ("Email", user.email.as_deref()),
            ("Phone", user.phone.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                lines.push(format!("{:<10} {value}", self.bold(label)));
            }
        }
        lines
    }

    /// Formats a response body, pretty-printing JSON.
    pub fn format_body(&self, body: &str) -> String {
        if body.trim().is_empty() {
            return self.dim("(empty response)");
        }
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| body.to_string())
    }

    /// Formats a command failure.
    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let api = error.downcast_ref::<ApiError>().or_else(|| {
            error
                .downcast_ref::<SessionError>()
                .and_then(SessionError::api_error)
        });

        match api {
            Some(api) => format!(
                "{}: {} {}",
                self.red("Error"),
                api.friendly_message(),
                self.dim(&format!("({})", api.kind()))
            ),
            None => format!("{}: {error:#}", self.red("Error")),
        }
    }

    /// Formats a one-line success message.
    pub fn format_done(&self, message: &str) -> String {
        format!("{} {message}", self.green("✓"))
    }

    fn outcome_text(&self, outcome: BootstrapOutcome) -> String {
        match outcome {
            BootstrapOutcome::ProfileLoaded => self.green("loaded"),
            BootstrapOutcome::CachedProfile => self.yellow("cached (server unreachable)"),
            BootstrapOutcome::NoProfile => self.yellow("unavailable"),
            BootstrapOutcome::SignedOut => self.red("session expired, signed out"),
            BootstrapOutcome::NoSession => self.dim("not signed in"),
        }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}
