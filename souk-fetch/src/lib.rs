// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Souk Fetch
//!
//! The network access layer shared by every Souk feature.
//!
//! ## Layers
//!
//! - [`transport::HttpTransport`] - Sends a prepared request, returns raw status/headers/body
//! - [`executor::RequestExecutor`] - Applies standard headers and classifies one response
//! - [`client::RetryingClient`] - Retries and shares identical reads; writes run once
//!
//! ## Classification
//!
//! [`classify::classify_response`] checks for HTML before mapping the status
//! code, so a proxy error page served with a 200 never reaches a JSON parser.
//! Transport failures become [`souk_core::ApiError::Timeout`] or
//! [`souk_core::ApiError::NetworkError`]; nothing else escapes.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use souk_fetch::{ClientSettings, RetryingClient};
//!
//! let client = RetryingClient::from_settings(&ClientSettings::default(), tokens)?;
//! let body = client.get(endpoints.api_url(&["listings"])).await?;
//! ```

pub mod classify;
pub mod client;
pub mod error;
pub mod executor;
pub mod inflight;
pub mod redact;
pub mod retry;
pub mod settings;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use classify::{
    classify_response, classify_transport_error, extract_server_message, is_html_response,
    parse_retry_after,
};
pub use client::RetryingClient;
pub use error::TransportError;
pub use executor::RequestExecutor;
pub use inflight::{InFlightRegistry, SharedCall};
pub use redact::redact_url;
pub use retry::{DEFAULT_FALLBACK_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};
pub use settings::{
    ClientSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
    DEFAULT_WRITE_TIMEOUT_SECS, USER_AGENT,
};
pub use transport::{HttpTransport, PreparedRequest, RawResponse, ReqwestTransport};
