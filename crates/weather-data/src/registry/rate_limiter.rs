//! Fixed-window rate limiter keyed by provider or client identity.
//!
//! Each key owns two fixed windows: a one-minute window and a one-day window.
//! A window starts at the first request after the previous one elapsed and
//! resets wholesale when it expires (fixed, not sliding). A request is allowed
//! only while both windows are below their limits.
//!
//! State is held in a `DashMap`, so concurrent callers on the same key are
//! serialized by that key's shard lock while unrelated keys proceed in parallel.
//! Every `*_at` method takes an explicit `now`; the plain variants use the wall
//! clock.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use log::debug;
use serde::Serialize;

use crate::errors::WeatherDataError;

/// Default per-minute limit when a key has no explicit configuration.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default per-day limit when a key has no explicit configuration.
pub const DEFAULT_REQUESTS_PER_DAY: u32 = 1_000;

fn minute() -> ChronoDuration {
    ChronoDuration::minutes(1)
}

fn day() -> ChronoDuration {
    ChronoDuration::days(1)
}

/// Rate limiter configuration for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per one-minute window.
    pub requests_per_minute: u32,
    /// Maximum requests per one-day window.
    pub requests_per_day: u32,
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32, requests_per_day: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_day,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            requests_per_day: DEFAULT_REQUESTS_PER_DAY,
        }
    }
}

/// Counters for one key. Only the limiter mutates these.
#[derive(Clone, Debug)]
struct ProviderRateLimitState {
    #[allow(dead_code)]
    provider_id: String,
    window_start: DateTime<Utc>,
    requests_this_window: u32,
    requests_today: u32,
    day_window_start: DateTime<Utc>,
    config: RateLimitConfig,
}

impl ProviderRateLimitState {
    fn new(provider_id: &str, config: RateLimitConfig, now: DateTime<Utc>) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            window_start: now,
            requests_this_window: 0,
            requests_today: 0,
            day_window_start: now,
            config,
        }
    }

    /// Roll expired windows forward.
    fn roll(&mut self, now: DateTime<Utc>) {
        if now - self.window_start >= minute() {
            self.window_start = now;
            self.requests_this_window = 0;
        }
        if now - self.day_window_start >= day() {
            self.day_window_start = now;
            self.requests_today = 0;
        }
    }

    fn allows(&self) -> bool {
        self.requests_this_window < self.config.requests_per_minute
            && self.requests_today < self.config.requests_per_day
    }

    fn record(&mut self) {
        self.requests_this_window = self.requests_this_window.saturating_add(1);
        self.requests_today = self.requests_today.saturating_add(1);
    }

    fn quota(&self) -> Quota {
        let minute_left = self
            .config
            .requests_per_minute
            .saturating_sub(self.requests_this_window);
        let day_left = self
            .config
            .requests_per_day
            .saturating_sub(self.requests_today);
        let minute_reset = self.window_start + minute();
        let day_reset = self.day_window_start + day();

        // The binding window decides when capacity comes back
        let reset_at = if day_left == 0 {
            day_reset
        } else if minute_left == 0 || minute_left <= day_left {
            minute_reset
        } else {
            day_reset
        };

        Quota {
            count: minute_left.min(day_left),
            reset_at,
        }
    }
}

/// Remaining capacity for a key, suitable for `X-RateLimit-*` style headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    /// Requests still allowed before a window blocks.
    pub count: u32,
    /// When the binding window rolls over.
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window rate limiter for many keys.
///
/// Keys are created on demand with the default configuration, or can be
/// pre-configured with [`configure`](Self::configure).
#[derive(Debug, Default)]
pub struct RateLimiter {
    states: DashMap<String, ProviderRateLimitState>,
    configs: DashMap<String, RateLimitConfig>,
    default_config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rate limiter whose unconfigured keys use `config`.
    pub fn with_default_config(config: RateLimitConfig) -> Self {
        Self {
            default_config: config,
            ..Self::default()
        }
    }

    /// Configure limits for a specific key. Existing counters are reset.
    pub fn configure(&self, key: &str, config: RateLimitConfig) {
        self.configs.insert(key.to_string(), config);
        self.states.remove(key);
    }

    fn config_for(&self, key: &str) -> RateLimitConfig {
        self.configs
            .get(key)
            .map(|c| *c.value())
            .unwrap_or(self.default_config)
    }

    fn with_state<R>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut ProviderRateLimitState) -> R,
    ) -> R {
        let config = self.config_for(key);
        let mut state = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| ProviderRateLimitState::new(key, config, now));
        state.roll(now);
        f(state.value_mut())
    }

    /// True iff both the minute and the day window have capacity.
    pub fn can_make_request(&self, key: &str) -> bool {
        self.can_make_request_at(key, Utc::now())
    }

    pub fn can_make_request_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.with_state(key, now, |state| state.allows())
    }

    /// Count one request against both windows.
    pub fn record_request(&self, key: &str) {
        self.record_request_at(key, Utc::now())
    }

    pub fn record_request_at(&self, key: &str, now: DateTime<Utc>) {
        self.with_state(key, now, |state| {
            state.record();
            debug!(
                "Rate limiter: '{}' at {}/{} per minute, {}/{} per day",
                key,
                state.requests_this_window,
                state.config.requests_per_minute,
                state.requests_today,
                state.config.requests_per_day
            );
        })
    }

    /// Check and record in one step.
    ///
    /// Used for inbound client protection, where the check and the increment
    /// must not interleave with another request for the same client.
    pub fn try_acquire(&self, key: &str) -> Result<Quota, WeatherDataError> {
        self.try_acquire_at(key, Utc::now())
    }

    pub fn try_acquire_at(&self, key: &str, now: DateTime<Utc>) -> Result<Quota, WeatherDataError> {
        self.with_state(key, now, |state| {
            if state.allows() {
                state.record();
                Ok(state.quota())
            } else {
                Err(WeatherDataError::QuotaExceeded {
                    provider: key.to_string(),
                    reset_at: state.quota().reset_at,
                })
            }
        })
    }

    /// Remaining capacity and reset time for a key.
    pub fn remaining(&self, key: &str) -> Quota {
        self.remaining_at(key, Utc::now())
    }

    pub fn remaining_at(&self, key: &str, now: DateTime<Utc>) -> Quota {
        self.with_state(key, now, |state| state.quota())
    }

    /// Reset the counters for a key.
    pub fn reset(&self, key: &str) {
        self.states.remove(key);
    }

    /// Drop keys whose day window has elapsed. Their counters would reset on
    /// next use anyway, so removal is invisible to callers. Returns how many
    /// keys were dropped.
    pub fn prune_idle(&self) -> usize {
        self.prune_idle_at(Utc::now())
    }

    pub fn prune_idle_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.states.len();
        self.states
            .retain(|_, state| now - state.day_window_start < day());
        let pruned = before.saturating_sub(self.states.len());
        if pruned > 0 {
            debug!("Rate limiter: pruned {} idle key(s)", pruned);
        }
        pruned
    }

    /// Number of keys currently holding counters.
    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_blocks_after_minute_limit_until_window_rolls() {
        let limiter = RateLimiter::new();
        limiter.configure("OPEN_METEO", RateLimitConfig::new(3, 100));
        let now = t0();

        for _ in 0..3 {
            assert!(limiter.can_make_request_at("OPEN_METEO", now));
            limiter.record_request_at("OPEN_METEO", now);
        }
        assert!(!limiter.can_make_request_at("OPEN_METEO", now));
        assert!(!limiter.can_make_request_at("OPEN_METEO", now + ChronoDuration::seconds(59)));

        assert!(limiter.can_make_request_at("OPEN_METEO", now + ChronoDuration::seconds(60)));
    }

    #[test]
    fn test_day_limit_outlives_minute_window() {
        let limiter = RateLimiter::new();
        limiter.configure("WEATHERAPI", RateLimitConfig::new(10, 2));
        let now = t0();

        limiter.record_request_at("WEATHERAPI", now);
        limiter.record_request_at("WEATHERAPI", now);
        assert!(!limiter.can_make_request_at("WEATHERAPI", now));

        let later = now + ChronoDuration::minutes(5);
        assert!(!limiter.can_make_request_at("WEATHERAPI", later));
        let quota = limiter.remaining_at("WEATHERAPI", later);
        assert_eq!(quota.count, 0);
        assert_eq!(quota.reset_at, now + ChronoDuration::days(1));

        assert!(limiter.can_make_request_at("WEATHERAPI", now + ChronoDuration::days(1)));
    }

    #[test]
    fn test_remaining_reports_minute_window() {
        let limiter = RateLimiter::new();
        limiter.configure("OPENWEATHERMAP", RateLimitConfig::new(5, 1_000));
        let now = t0();

        limiter.record_request_at("OPENWEATHERMAP", now);
        limiter.record_request_at("OPENWEATHERMAP", now);

        let quota = limiter.remaining_at("OPENWEATHERMAP", now + ChronoDuration::seconds(10));
        assert_eq!(quota.count, 3);
        assert_eq!(quota.reset_at, now + ChronoDuration::minutes(1));
    }

    #[test]
    fn test_per_key_isolation() {
        let limiter = RateLimiter::with_default_config(RateLimitConfig::new(1, 10));
        let now = t0();

        limiter.record_request_at("client-a", now);
        assert!(!limiter.can_make_request_at("client-a", now));
        assert!(limiter.can_make_request_at("client-b", now));
    }

    #[test]
    fn test_try_acquire_fails_closed() {
        let limiter = RateLimiter::with_default_config(RateLimitConfig::new(2, 10));
        let now = t0();

        assert_eq!(limiter.try_acquire_at("client", now).unwrap().count, 1);
        assert_eq!(limiter.try_acquire_at("client", now).unwrap().count, 0);

        match limiter.try_acquire_at("client", now) {
            Err(WeatherDataError::QuotaExceeded { provider, reset_at }) => {
                assert_eq!(provider, "client");
                assert_eq!(reset_at, now + ChronoDuration::minutes(1));
            }
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_restores_capacity() {
        let limiter = RateLimiter::with_default_config(RateLimitConfig::new(1, 1));
        limiter.record_request("key");
        assert!(!limiter.can_make_request("key"));

        limiter.reset("key");
        assert!(limiter.can_make_request("key"));
    }

    #[test]
    fn test_prune_idle_drops_only_expired_keys() {
        let limiter = RateLimiter::with_default_config(RateLimitConfig::new(5, 5));
        let now = t0();

        limiter.record_request_at("old-client", now);
        limiter.record_request_at("new-client", now + ChronoDuration::hours(12));
        assert_eq!(limiter.tracked_keys(), 2);

        assert_eq!(limiter.prune_idle_at(now + ChronoDuration::hours(23)), 0);
        assert_eq!(limiter.prune_idle_at(now + ChronoDuration::days(1)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(
            limiter
                .remaining_at("new-client", now + ChronoDuration::days(1))
                .count,
            4
        );

        // A pruned key starts over with a full quota
        assert_eq!(
            limiter
                .remaining_at("old-client", now + ChronoDuration::days(1))
                .count,
            5
        );
    }

    #[test]
    fn test_concurrent_acquire_never_exceeds_limit() {
        let limiter = Arc::new(RateLimiter::with_default_config(RateLimitConfig::new(50, 1_000)));
        let now = t0();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.try_acquire_at("shared", now).is_ok())
                        .count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 50);
    }
}
