//! Client-side call budgeting for the Bitstamp REST API
//!
//! Bitstamp bans clients that exceed its request allowance, so the gateway
//! counts calls per fixed window and refuses to send once the window's
//! budget is spent. The window is reset by a timer owned by the gateway.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default window length (one minute)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of calls allowed per window
pub const DEFAULT_MAX_CALLS_PER_WINDOW: u32 = 60;

/// Rate limit configuration for one gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Whether calls over budget are refused
    pub enabled: bool,
    /// Calls allowed per window
    pub max_calls_per_window: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::bitstamp_defaults()
    }
}

impl RateLimitConfig {
    /// 60 calls per 60 seconds
    pub const fn bitstamp_defaults() -> Self {
        Self {
            enabled: true,
            max_calls_per_window: DEFAULT_MAX_CALLS_PER_WINDOW,
            window: DEFAULT_WINDOW,
        }
    }

    /// Custom budget
    pub const fn new(max_calls_per_window: u32, window: Duration) -> Self {
        Self {
            enabled: true,
            max_calls_per_window,
            window,
        }
    }

    /// Count calls but never refuse them
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_calls_per_window: DEFAULT_MAX_CALLS_PER_WINDOW,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Result of registering a call against the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request may proceed
    Allowed,
    /// Window budget exhausted
    Limited {
        /// Configured calls per window
        limit: u32,
        /// Window length
        window: Duration,
    },
}

impl RateLimitResult {
    /// Check if the request is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Per-gateway call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallBudget {
    total_calls: u64,
    calls_in_window: u32,
    last_call: Option<DateTime<Utc>>,
    window_started: Option<DateTime<Utc>>,
}

impl CallBudget {
    /// Create an empty budget whose window starts now
    pub fn new() -> Self {
        Self {
            window_started: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Count a call attempt and decide whether it may be sent
    ///
    /// The call is refused once the incremented count exceeds the limit, so
    /// exactly `max_calls_per_window` calls pass per window. A stricter
    /// reading ("the count never reaches the limit") would let one fewer
    /// through.
    ///
    /// Both counters are incremented even when the call is refused.
    /// `last_call` only moves for calls that are allowed through.
    pub fn register_call(&mut self, config: &RateLimitConfig, now: DateTime<Utc>) -> RateLimitResult {
        self.total_calls = self.total_calls.saturating_add(1);
        self.calls_in_window = self.calls_in_window.saturating_add(1);

        if config.enabled && self.calls_in_window > config.max_calls_per_window {
            return RateLimitResult::Limited {
                limit: config.max_calls_per_window,
                window: config.window,
            };
        }

        self.last_call = Some(now);
        RateLimitResult::Allowed
    }

    /// Start a new window
    pub fn reset_window(&mut self, now: DateTime<Utc>) {
        self.calls_in_window = 0;
        self.window_started = Some(now);
    }

    /// Calls attempted over the gateway's lifetime
    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Calls attempted in the current window
    pub fn calls_in_window(&self) -> u32 {
        self.calls_in_window
    }

    /// Wall-clock time of the last call let through
    pub fn last_call(&self) -> Option<DateTime<Utc>> {
        self.last_call
    }

    /// Wall-clock time the current window started
    pub fn window_started(&self) -> Option<DateTime<Utc>> {
        self.window_started
    }
}
