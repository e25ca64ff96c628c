// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Souk Session
//!
//! Authentication state for the Souk client.
//!
//! [`AuthSession`] drives the three-state [`souk_core::AuthState`] signal:
//!
//! - **initialize**: optimistic Authenticated when a token is stored, then bootstrap
//! - **bootstrap**: profile endpoints in order; one refresh on 401; sign out if it persists
//! - **refresh_token**: primary endpoint, then the frontend proxy
//! - **sign_out**: clears every persisted field
//! - **login / register / exchange**: validate and persist the returned tokens, then bootstrap
//!
//! Non-401 profile failures never sign the user out; the cached profile is
//! restored instead.
//!
//! ## Example
//!
//! ```ignore
//! use souk_session::{ApiEndpoints, AuthRoutes, AuthSession};
//!
//! let endpoints = ApiEndpoints::from_config(&config.api)?;
//! let routes = AuthRoutes::new(&endpoints, &config.auth);
//! let session = AuthSession::new(client, tokens.store, routes);
//!
//! let report = session.initialize().await;
//! println!("{} ({})", session.state(), report.outcome);
//! ```

pub mod endpoints;
pub mod error;
pub mod parser;
pub mod refresh;
pub mod report;
pub mod session;

pub use endpoints::{ApiEndpoints, AuthRoutes, normalize_api_url, normalize_frontend_url};
pub use error::SessionError;
pub use parser::{AuthPayload, parse_auth_response, parse_profile};
pub use refresh::refresh_with_fallback;
pub use report::{BootstrapOutcome, BootstrapReport, EndpointAttempt};
pub use session::AuthSession;
