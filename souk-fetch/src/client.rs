//! Retrying client with in-flight sharing.

use std::sync::Arc;

use souk_core::{ApiResult, HttpMethod, Request, TokenSource};
use tracing::{debug, instrument};
use url::Url;

use crate::error::TransportError;
use crate::executor::RequestExecutor;
use crate::inflight::InFlightRegistry;
use crate::redact::redact_url;
use crate::retry::RetryPolicy;
use crate::settings::ClientSettings;

// ============================================================================
// Retrying Client
// ============================================================================

/// Client used by feature code.
///
/// Only GET is retried and shared while in flight. POST, PUT, PATCH, and
/// DELETE reach the executor exactly once.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    executor: Arc<RequestExecutor>,
    policy: RetryPolicy,
    in_flight: InFlightRegistry,
}

impl RetryingClient {
    /// Creates a client over an executor.
    pub fn new(executor: Arc<RequestExecutor>, policy: RetryPolicy) -> Self {
        Self {
            executor,
            policy,
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Creates a reqwest-backed client from settings.
    pub fn from_settings(
        settings: &ClientSettings,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, TransportError> {
        let executor = RequestExecutor::with_settings(settings, tokens)?;
        Ok(Self::new(Arc::new(executor), settings.retry.clone()))
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of reads currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Performs a GET.
    pub async fn get(&self, url: Url) -> ApiResult<String> {
        self.send(Request::get(url)).await
    }

    /// Performs a POST with a JSON body.
    pub async fn post(&self, url: Url, body: impl Into<String>) -> ApiResult<String> {
        self.send(Request::post(url, body)).await
    }

    /// Performs a PUT with a JSON body.
    pub async fn put(&self, url: Url, body: impl Into<String>) -> ApiResult<String> {
        self.send(Request::put(url, body)).await
    }

    /// Performs a PATCH with a JSON body.
    pub async fn patch(&self, url: Url, body: impl Into<String>) -> ApiResult<String> {
        self.send(Request::patch(url, body)).await
    }

    /// Performs a DELETE.
    pub async fn delete(&self, url: Url) -> ApiResult<String> {
        self.send(Request::delete(url)).await
    }

    /// Sends a prebuilt request.
    ///
    /// GET requests go through the in-flight registry and the retry policy.
    /// Every other method is executed once.
    pub async fn send(&self, request: Request) -> ApiResult<String> {
        if request.method() == HttpMethod::Get {
            self.shared_get(request).await
        } else {
            self.executor.execute(&request).await
        }
    }

    #[instrument(skip(self, request), fields(url = %redact_url(request.url())))]
    async fn shared_get(&self, request: Request) -> ApiResult<String> {
        let key = request.in_flight_key();
        let executor = Arc::clone(&self.executor);
        let policy = self.policy.clone();

        let (call, owner) = self.in_flight.join_or_start(key, move || async move {
            policy.run(|_| executor.execute(&request)).await
        });

        if !owner {
            debug!("Reusing in-flight request");
        }
        call.await
    }
}

// ============================================================================
// Tests
// ============================================================================
