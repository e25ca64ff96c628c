//! Scripted transport for tests.
//!
//! Enabled for this crate's own tests and, through the `test-util`
//! feature, for downstream crates.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use souk_core::{HttpMethod, TokenSource};

use crate::error::TransportError;
use crate::transport::{HttpTransport, PreparedRequest, RawResponse};

type Outcome = Result<RawResponse, TransportError>;

#[derive(Default)]
struct Script {
    routes: HashMap<(HttpMethod, String), VecDeque<Outcome>>,
    calls: Vec<PreparedRequest>,
}

/// Transport that replays scripted outcomes per method and path.
///
/// Each route holds a queue. Outcomes are consumed in order and the last one
/// repeats forever. Routes with no script answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: HttpMethod, path: &str, outcome: Outcome) {
        let mut script = self.script();
        script
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    /// Queues a response with a status and body.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        self.push(method, path, Ok(RawResponse::new(status, body)));
    }

    /// Queues a fully built response.
    pub fn respond_with(&self, method: HttpMethod, path: &str, response: RawResponse) {
        self.push(method, path, Ok(response));
    }

    /// Queues a transport failure.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.push(method, path, Err(error));
    }

    /// Returns every request sent so far.
    pub fn calls(&self) -> Vec<PreparedRequest> {
        self.script().calls.clone()
    }

    /// Counts requests sent to a route.
    pub fn call_count(&self, method: HttpMethod, path: &str) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.method == method && call.url.path() == path)
            .count()
    }

    fn next_outcome(&self, request: &PreparedRequest) -> Outcome {
        let mut script = self.script();
        script.calls.push(request.clone());

        let key = (request.method, request.url.path().to_string());
        let Some(queue) = script.routes.get_mut(&key) else {
            return Ok(RawResponse::new(404, ""));
        };
        if queue.len() > 1 {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| Ok(RawResponse::new(404, "")))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        let outcome = self.next_outcome(&request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        outcome
    }
}

/// Token source holding a fixed token.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Creates a source that always returns `token`.
    pub fn new(token: Option<&str>) -> Self {
        Self(token.map(str::to_string))
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}
