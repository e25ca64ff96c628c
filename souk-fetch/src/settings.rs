//! Client settings.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default write timeout in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;

/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// User agent string for Souk.
pub const USER_AGENT: &str = concat!("Souk/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP client stack.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Budget for establishing a connection.
    pub connect_timeout: Duration,
    /// Budget for sending the request.
    pub write_timeout: Duration,
    /// Budget for each read of the response.
    pub read_timeout: Duration,
    /// Retry policy applied to GET requests.
    pub retry: RetryPolicy,
    /// User agent header value.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientSettings {
    /// Sets all three timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, write: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.write_timeout = write;
        self.read_timeout = read;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upper bound for a whole request.
    ///
    /// reqwest has no per-write timeout, so the write budget is folded into
    /// this overall deadline.
    pub fn request_deadline(&self) -> Duration {
        self.connect_timeout + self.write_timeout + self.read_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let settings = ClientSettings::default();
        assert_eq!(settings.connect_timeout, Duration::from_secs(30));
        assert_eq!(settings.write_timeout, Duration::from_secs(30));
        assert_eq!(settings.read_timeout, Duration::from_secs(60));
        assert_eq!(settings.request_deadline(), Duration::from_secs(120));
        assert!(settings.user_agent.starts_with("Souk/"));
    }
}
