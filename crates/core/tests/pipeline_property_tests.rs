//! Property-based integration tests for the forecast pipeline.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use routecast_core::cache::forecast_cache_key;
use routecast_core::{ForecastPreferences, ForecastSettings, RawPoint, Route, RoutePoint};
use routecast_weather_data::{
    ConsensusAggregator, RateLimitConfig, RateLimiter, WeatherField, WeatherSample,
};

// =============================================================================
// Generators
// =============================================================================

/// Generates a route of 2..30 points within Europe.
fn arb_route() -> impl Strategy<Value = Route> {
    proptest::collection::vec((36.0f64..60.0, -10.0f64..30.0), 2..30).prop_map(|coords| {
        Route::new(
            "generated",
            coords
                .into_iter()
                .map(|(lat, lon)| RawPoint::new(lat, lon))
                .collect(),
        )
    })
}

/// Generates 1..6 samples from distinct providers.
fn arb_samples() -> impl Strategy<Value = Vec<WeatherSample>> {
    proptest::collection::vec((-30.0f64..45.0, 5.0f64..100.0, 0.0f64..30.0, 0.0f64..360.0), 1..6)
        .prop_map(|readings| {
            readings
                .into_iter()
                .enumerate()
                .map(|(i, (temp, humidity, wind, deg))| {
                    let mut sample = WeatherSample::new(format!("P{}", i), temp, humidity);
                    sample.wind_speed = wind;
                    sample.wind_deg = deg;
                    sample
                })
                .collect()
        })
}

fn settings() -> ForecastSettings {
    ForecastSettings::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap())
}

fn key(points: &[RoutePoint], settings: &ForecastSettings) -> String {
    forecast_cache_key(points, settings, &ForecastPreferences::default())
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Identical inputs always produce the same key.
    #[test]
    fn prop_cache_key_is_deterministic(route in arb_route()) {
        let a = key(&route.route_points(), &settings());
        let b = key(&route.clone().route_points(), &settings());
        prop_assert_eq!(a.len(), 64);
        prop_assert_eq!(a, b);
    }

    /// Any change to the start time changes the key.
    #[test]
    fn prop_cache_key_tracks_start_time(route in arb_route(), minutes in 1i64..10_000) {
        let points = route.route_points();
        let later = ForecastSettings {
            start_time: settings().start_time + Duration::minutes(minutes),
            ..settings()
        };
        prop_assert_ne!(key(&points, &settings()), key(&points, &later));
    }

    /// The limiter never grants more than the minute limit within one window.
    #[test]
    fn prop_rate_limiter_never_exceeds_limit(limit in 1u32..50, attempts in 0usize..120) {
        let limiter = RateLimiter::with_default_config(RateLimitConfig::new(limit, 10_000));
        let now = Utc::now();

        let granted = (0..attempts)
            .filter(|_| limiter.try_acquire_at("client", now).is_ok())
            .count();

        prop_assert_eq!(granted, attempts.min(limit as usize));
        prop_assert_eq!(limiter.can_make_request_at("client", now), attempts < limit as usize);
    }

    /// Consensus values stay within the range of their inputs and the score
    /// stays within 0..=100.
    #[test]
    fn prop_consensus_is_bounded(samples in arb_samples()) {
        let order = samples.iter().map(|s| s.provider_id.clone()).collect();
        let consensus = ConsensusAggregator::new(order).aggregate(&samples).unwrap();

        let temps: Vec<f64> = samples.iter().map(|s| s.temp).collect();
        let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let temp = consensus.field(WeatherField::Temp).unwrap();

        prop_assert!(temp.value >= min - 1e-9 && temp.value <= max + 1e-9);
        prop_assert!(temp.variance >= 0.0);
        prop_assert!((0.0..=100.0).contains(&consensus.agreement_score));
        prop_assert_eq!(consensus.source_count, samples.len());
        if samples.len() < 3 {
            prop_assert!(consensus.outlier_sources.is_empty());
        }
        if samples.len() == 1 {
            prop_assert_eq!(consensus.agreement_score, 100.0);
        }
    }
}
