//! Service-wide tuning, read from `ROUTECAST_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use log::warn;

use routecast_weather_data::RateLimitConfig;

use crate::alerts::AlertThresholds;
use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CLIENT_REQUESTS_PER_DAY, DEFAULT_CLIENT_REQUESTS_PER_MINUTE,
    DEFAULT_FORECAST_TTL_SECS, DEFAULT_INTER_CHUNK_DELAY_MS, DEFAULT_POINT_CONCURRENCY,
    DEFAULT_PROGRESSIVE_THRESHOLD, DEFAULT_ROUTE_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::progressive::ProgressiveConfig;

pub const ENV_FORECAST_TTL_SECS: &str = "ROUTECAST_FORECAST_TTL_SECS";
/// `0` keeps parsed routes until evicted explicitly.
pub const ENV_ROUTE_TTL_SECS: &str = "ROUTECAST_ROUTE_TTL_SECS";
pub const ENV_PROGRESSIVE_THRESHOLD: &str = "ROUTECAST_PROGRESSIVE_THRESHOLD";
pub const ENV_CHUNK_SIZE: &str = "ROUTECAST_CHUNK_SIZE";
pub const ENV_INTER_CHUNK_DELAY_MS: &str = "ROUTECAST_INTER_CHUNK_DELAY_MS";
pub const ENV_POINT_CONCURRENCY: &str = "ROUTECAST_POINT_CONCURRENCY";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "ROUTECAST_SWEEP_INTERVAL_SECS";
pub const ENV_CLIENT_REQUESTS_PER_MINUTE: &str = "ROUTECAST_CLIENT_REQUESTS_PER_MINUTE";
pub const ENV_CLIENT_REQUESTS_PER_DAY: &str = "ROUTECAST_CLIENT_REQUESTS_PER_DAY";
pub const ENV_ALERT_WIND_SPEED_MS: &str = "ROUTECAST_ALERT_WIND_SPEED_MS";
pub const ENV_ALERT_HIGH_TEMP_C: &str = "ROUTECAST_ALERT_HIGH_TEMP_C";
pub const ENV_ALERT_LOW_TEMP_C: &str = "ROUTECAST_ALERT_LOW_TEMP_C";
pub const ENV_ALERT_PRECIPITATION_MM: &str = "ROUTECAST_ALERT_PRECIPITATION_MM";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub forecast_ttl: Duration,
    /// `None` means parsed routes never expire
    pub route_ttl: Option<Duration>,
    /// Routes with more sample points than this go through the coordinator
    pub progressive_threshold: usize,
    pub progressive: ProgressiveConfig,
    /// Points fetched concurrently within a chunk
    pub point_concurrency: usize,
    pub alert_thresholds: AlertThresholds,
    /// Inbound quota per client id
    pub client_rate_limit: RateLimitConfig,
    /// Period of the background cache sweeper, when one is spawned
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            forecast_ttl: Duration::from_secs(DEFAULT_FORECAST_TTL_SECS),
            route_ttl: Some(Duration::from_secs(DEFAULT_ROUTE_TTL_SECS)),
            progressive_threshold: DEFAULT_PROGRESSIVE_THRESHOLD,
            progressive: ProgressiveConfig::default(),
            point_concurrency: DEFAULT_POINT_CONCURRENCY,
            alert_thresholds: AlertThresholds::default(),
            client_rate_limit: RateLimitConfig::new(
                DEFAULT_CLIENT_REQUESTS_PER_MINUTE,
                DEFAULT_CLIENT_REQUESTS_PER_DAY,
            ),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` onto the defaults.
    ///
    /// Unparseable or out-of-range values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = parse::<u64>(&lookup, ENV_FORECAST_TTL_SECS)
            .filter(|s| positive(ENV_FORECAST_TTL_SECS, *s))
        {
            config.forecast_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, ENV_ROUTE_TTL_SECS) {
            config.route_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(threshold) = parse(&lookup, ENV_PROGRESSIVE_THRESHOLD) {
            config.progressive_threshold = threshold;
        }
        if let Some(size) = parse::<usize>(&lookup, ENV_CHUNK_SIZE)
            .filter(|s| positive(ENV_CHUNK_SIZE, *s as u64))
        {
            config.progressive.chunk_size = size;
        }
        if let Some(ms) = parse(&lookup, ENV_INTER_CHUNK_DELAY_MS) {
            config.progressive.inter_chunk_delay = Duration::from_millis(ms);
        }
        if let Some(n) = parse::<usize>(&lookup, ENV_POINT_CONCURRENCY)
            .filter(|n| positive(ENV_POINT_CONCURRENCY, *n as u64))
        {
            config.point_concurrency = n;
        }
        if let Some(secs) = parse::<u64>(&lookup, ENV_SWEEP_INTERVAL_SECS)
            .filter(|s| positive(ENV_SWEEP_INTERVAL_SECS, *s))
        {
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(n) = parse(&lookup, ENV_CLIENT_REQUESTS_PER_MINUTE) {
            config.client_rate_limit.requests_per_minute = n;
        }
        if let Some(n) = parse(&lookup, ENV_CLIENT_REQUESTS_PER_DAY) {
            config.client_rate_limit.requests_per_day = n;
        }

        let alerts = &mut config.alert_thresholds;
        if let Some(v) = parse(&lookup, ENV_ALERT_WIND_SPEED_MS) {
            alerts.wind_speed_ms = v;
        }
        if let Some(v) = parse(&lookup, ENV_ALERT_HIGH_TEMP_C) {
            alerts.high_temp_c = v;
        }
        if let Some(v) = parse(&lookup, ENV_ALERT_LOW_TEMP_C) {
            alerts.low_temp_c = v;
        }
        if let Some(v) = parse(&lookup, ENV_ALERT_PRECIPITATION_MM) {
            alerts.precipitation_mm = v;
        }

        config
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}

fn positive(key: &str, value: u64) -> bool {
    if value == 0 {
        warn!("Ignoring {}=0, must be positive", key);
    }
    value > 0
}
