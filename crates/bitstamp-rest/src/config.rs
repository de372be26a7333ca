//! Gateway configuration

use bitstamp_types::RateLimitConfig;
use std::time::Duration;

/// Current REST API base
pub const API_BASE_URL: &str = "https://www.bitstamp.net/api/v2";

/// Legacy REST API base, still serving a few private endpoints
pub const LEGACY_API_BASE_URL: &str = "https://www.bitstamp.net/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = concat!("bitstamp-rs/", env!("CARGO_PKG_VERSION"));

/// What to do with a 2xx response whose body is not valid JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Return a parse error
    #[default]
    Fail,
    /// Return the raw text as the response body
    Passthrough,
}

/// REST gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL for current endpoints
    pub base_url: String,
    /// Base URL for legacy endpoints
    pub legacy_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Call budget
    pub rate_limit: RateLimitConfig,
    /// Handling of non-JSON success bodies
    pub parse_failure: ParseFailurePolicy,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            legacy_base_url: LEGACY_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
            parse_failure: ParseFailurePolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both base URLs (useful for proxies and tests)
    pub fn with_base_urls(mut self, base_url: impl Into<String>, legacy_base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.legacy_base_url = legacy_base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the call budget
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set how non-JSON success bodies are handled
    pub fn with_parse_failure(mut self, policy: ParseFailurePolicy) -> Self {
        self.parse_failure = policy;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL to use for a call
    pub fn base_for(&self, legacy: bool) -> &str {
        if legacy {
            &self.legacy_base_url
        } else {
            &self.base_url
        }
    }
}
