//! Provider quota declarations.
//!
//! Each provider declares the free-tier limits it is subject to; the registry
//! uses them to configure its rate limiter.

use crate::registry::RateLimitConfig;

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their rate limits and getting blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Maximum requests allowed per day.
    pub requests_per_day: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_day: 1_000,
        }
    }
}

impl From<RateLimit> for RateLimitConfig {
    fn from(limit: RateLimit) -> Self {
        RateLimitConfig::new(limit.requests_per_minute, limit.requests_per_day)
    }
}
