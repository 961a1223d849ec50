//! Client configuration.

use std::time::Duration;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Transport settings for [`PolygonProvider`](crate::PolygonProvider).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolygonConfig {
    /// API host, without a trailing slash.
    pub base_url: String,
    /// Hard limit for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub initial_backoff: Duration,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl PolygonConfig {
    /// Sets the API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial backoff.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}
