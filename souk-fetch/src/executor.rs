//! Single-request executor.

use std::sync::Arc;

use souk_core::{ApiResult, Request, TokenSource};
use tracing::{debug, instrument, warn};

use crate::classify::{classify_response, classify_transport_error};
use crate::error::TransportError;
use crate::redact::redact_url;
use crate::settings::ClientSettings;
use crate::transport::{HttpTransport, PreparedRequest, ReqwestTransport};

const APPLICATION_JSON: &str = "application/json";

/// Headers only the executor sets. Extra request headers with these names
/// are dropped.
const RESERVED_HEADERS: [&str; 3] = ["Accept", "Content-Type", "Authorization"];

fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

// ============================================================================
// Request Executor
// ============================================================================

/// Builds, sends, and classifies one request.
///
/// Applies `Accept: application/json` always, `Content-Type:
/// application/json` when a body is present, and `Authorization: Bearer`
/// when the request requires auth and a token is available. A missing token
/// is never an error here. Extra headers cannot override these three.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Creates an executor over the given transport and token source.
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { transport, tokens }
    }

    /// Creates an executor backed by reqwest.
    pub fn with_settings(
        settings: &ClientSettings,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport), tokens))
    }

    /// Applies the standard headers and produces the wire request.
    pub fn prepare(&self, request: &Request) -> PreparedRequest {
        let mut headers = vec![("Accept".to_string(), APPLICATION_JSON.to_string())];

        if request.body().is_some() {
            headers.push(("Content-Type".to_string(), APPLICATION_JSON.to_string()));
        }

        if request.requires_auth() {
            match self.tokens.access_token() {
                Some(token) if !token.trim().is_empty() => {
                    headers.push(("Authorization".to_string(), format!("Bearer {}", token.trim())));
                }
                _ => debug!("No access token available, sending without Authorization"),
            }
        }

        for (name, value) in request.headers() {
            if is_reserved(name) {
                debug!(header = %name, "Ignoring reserved header");
                continue;
            }
            headers.push((name.clone(), value.clone()));
        }

        PreparedRequest {
            method: request.method(),
            url: request.url().clone(),
            headers,
            body: request.body().map(str::to_string),
        }
    }

    /// Executes a request once and classifies the outcome.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %redact_url(request.url())))]
    pub async fn execute(&self, request: &Request) -> ApiResult<String> {
        let prepared = self.prepare(request);

        match self.transport.send(prepared).await {
            Ok(response) => {
                let status = response.status;
                let result = classify_response(response);
                match &result {
                    Ok(body) => debug!(status, bytes = body.len(), "Request succeeded"),
                    Err(err) => warn!(status, kind = err.kind(), error = %err, "Request failed"),
                }
                result
            }
            Err(err) => {
                warn!(error = %err, "Transport failure");
                Err(classify_transport_error(&err))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
