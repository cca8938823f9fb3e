//! Tests for WeatherForecastService: caching, failure isolation, progressive
//! loading and client quotas.

#[cfg(test)]
mod tests {
    use crate::alerts::AlertKind;
    use crate::errors::{Error, ValidationError};
    use crate::forecast::{
        ForecastRequest, ForecastStatus, WeatherForecastService, WeatherForecastServiceTrait,
    };
    use crate::progressive::{ChannelProgressReporter, ProgressEvent, ProgressReporter};
    use crate::routes::{RawPoint, Route};
    use crate::settings::{ForecastPreferences, ForecastSettings, ServiceConfig, Units};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use futures::StreamExt;
    use routecast_weather_data::{
        Backoff, Coordinates, ProviderRegistry, RateLimit, RateLimitConfig, RateLimiter,
        RetryPolicy, WeatherDataError, WeatherProvider, WeatherSample,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    // ==================== Mock provider ====================

    enum Failure {
        Never,
        Always,
        /// Fail within 0.003° of this latitude
        NearLat(f64),
    }

    struct MockProvider {
        id: &'static str,
        priority: u8,
        temp: f64,
        wind_speed: f64,
        failure: Failure,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: u8) -> Self {
            Self {
                id,
                priority,
                temp: 20.0,
                wind_speed: 3.0,
                failure: Failure::Never,
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing(mut self, failure: Failure) -> Self {
            self.failure = failure;
            self
        }

        fn with_wind(mut self, wind_speed: f64) -> Self {
            self.wind_speed = wind_speed;
            self
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit {
                requests_per_minute: 10_000,
                requests_per_day: 100_000,
            }
        }

        async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, WeatherDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            let fail = match self.failure {
                Failure::Never => false,
                Failure::Always => true,
                Failure::NearLat(lat) => (coords.lat - lat).abs() < 0.003,
            };
            if fail {
                return Err(WeatherDataError::Upstream {
                    provider: self.id.to_string(),
                    message: "Mock failure".to_string(),
                    status: Some(503),
                });
            }

            let mut sample = WeatherSample::new(self.id, self.temp, 55.0);
            sample.wind_speed = self.wind_speed;
            Ok(sample)
        }
    }

    // ==================== Fixtures ====================

    /// Latitude of the 10 km sample on the test route.
    const LAT_AT_10_KM: f64 = 45.0 + 10.0 / 111.195;

    /// ~18.9 km due north; at 5 km spacing this samples 0, 5, 10, 15 and the end.
    fn route() -> Route {
        Route::new(
            "Col test",
            vec![RawPoint::new(45.0, 7.0), RawPoint::new(45.17, 7.0)],
        )
    }

    fn settings() -> ForecastSettings {
        ForecastSettings::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap())
            .with_interval_km(5.0)
    }

    fn config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.progressive.inter_chunk_delay = Duration::ZERO;
        config.progressive.chunk_policy =
            RetryPolicy::new(0, Duration::from_secs(5)).with_backoff(Backoff::none());
        config
    }

    fn service(providers: Vec<Arc<dyn WeatherProvider>>, config: ServiceConfig) -> WeatherForecastService {
        let policy = RetryPolicy::new(1, Duration::from_secs(2)).with_backoff(Backoff::none());
        let registry = ProviderRegistry::with_config(providers, RateLimiter::new(), policy);
        WeatherForecastService::in_memory(Arc::new(registry), config)
    }

    struct CancelAfter {
        chunks: usize,
        token: CancellationToken,
    }

    impl ProgressReporter for CancelAfter {
        fn report(&self, event: &ProgressEvent) {
            if event.current == self.chunks {
                self.token.cancel();
            }
        }
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_identical_request_is_served_from_cache() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha.clone()];
        let service = service(providers, config());
        let request = ForecastRequest::new(route(), settings());

        let first = service.get_forecast(&request).await.unwrap();
        assert!(!first.cache_hit);
        assert_eq!(first.forecasts.len(), 5);
        assert_eq!(alpha.calls(), 5);

        let second = service.get_forecast(&request).await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.forecasts, first.forecasts);
        assert_eq!(alpha.calls(), 5, "cache hit must not reach providers");
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_preferences_change_the_cache_key() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha.clone()];
        let service = service(providers, config());

        let single = ForecastRequest::new(route(), settings());
        let multi = single.clone().with_preferences(ForecastPreferences::multi());

        service.get_forecast(&single).await.unwrap();
        let response = service.get_forecast(&multi).await.unwrap();
        assert!(!response.cache_hit);
        assert_eq!(alpha.calls(), 10);
    }

    #[tokio::test]
    async fn test_two_of_three_providers_failing_at_one_point() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1).failing(Failure::NearLat(LAT_AT_10_KM)));
        let bravo = Arc::new(MockProvider::new("BRAVO", 2).failing(Failure::NearLat(LAT_AT_10_KM)));
        let charlie = Arc::new(MockProvider::new("CHARLIE", 3));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha, bravo, charlie];
        let service = service(providers, config());

        let request =
            ForecastRequest::new(route(), settings()).with_preferences(ForecastPreferences::multi());
        let response = service.get_forecast(&request).await.unwrap();

        assert_eq!(response.forecasts.len(), 5);
        assert_eq!(response.failed_points, 0);

        let degraded = &response.forecasts[2];
        assert!((degraded.route_point.distance_km - 10.0).abs() < 1e-9);
        assert_eq!(degraded.status, ForecastStatus::Degraded);
        assert_eq!(degraded.provider_errors.len(), 2);
        assert_eq!(degraded.all_samples.len(), 1);
        assert_eq!(
            degraded.primary_sample.as_ref().unwrap().provider_id,
            "CHARLIE"
        );
        assert_eq!(degraded.consensus.as_ref().unwrap().agreement_score, 100.0);

        for (i, forecast) in response.forecasts.iter().enumerate().filter(|(i, _)| *i != 2) {
            assert_eq!(forecast.status, ForecastStatus::Ok, "point {}", i);
            assert_eq!(forecast.consensus.as_ref().unwrap().source_count, 3);
        }
    }

    #[tokio::test]
    async fn test_point_without_data_is_marked_failed_and_not_cached() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1).failing(Failure::NearLat(LAT_AT_10_KM)));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha.clone()];
        let service = service(providers, config());
        let request = ForecastRequest::new(route(), settings());

        let response = service.get_forecast(&request).await.unwrap();
        assert_eq!(response.forecasts.len(), 5);
        assert_eq!(response.failed_points, 1);
        assert!(response.forecasts[2].is_failed());
        assert!(response.forecasts[2].primary_sample.is_none());

        let again = service.get_forecast(&request).await.unwrap();
        assert!(!again.cache_hit);
    }

    #[tokio::test]
    async fn test_all_points_failing_is_a_request_error() {
        let providers: Vec<Arc<dyn WeatherProvider>> =
            vec![Arc::new(MockProvider::new("ALPHA", 1).failing(Failure::Always))];
        let service = service(providers, config());

        let err = service
            .get_forecast(&ForecastRequest::new(route(), settings()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllProvidersFailed { points: 5 }));
    }

    #[tokio::test]
    async fn test_short_route_is_rejected_before_any_fetch() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha.clone()];
        let service = service(providers, config());

        let route = Route::new("Dot", vec![RawPoint::new(45.0, 7.0)]);
        let err = service
            .get_forecast(&ForecastRequest::new(route, settings()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooFewPoints(1))
        ));
        assert_eq!(alpha.calls(), 0);
    }

    #[tokio::test]
    async fn test_progressive_job_cancelled_after_second_of_five_chunks() {
        let alpha = Arc::new(MockProvider::new("ALPHA", 1));
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![alpha.clone()];
        let mut config = config();
        config.progressive_threshold = 5;
        config.progressive.chunk_size = 2;
        let service = service(providers, config);

        // 2.5 km spacing gives 9 sample points, so 5 chunks of 2
        let request = ForecastRequest::new(route(), settings().with_interval_km(2.5));
        let cancel = CancellationToken::new();
        let reporter = CancelAfter {
            chunks: 2,
            token: cancel.clone(),
        };

        let response = service
            .get_forecast_with_progress(&request, &reporter, &cancel)
            .await
            .unwrap();

        assert!(response.cancelled);
        assert_eq!(response.total_points, 9);
        let distances: Vec<f64> = response
            .forecasts
            .iter()
            .map(|f| f.route_point.distance_km)
            .collect();
        assert_eq!(distances, vec![0.0, 2.5, 5.0, 7.5]);
        assert_eq!(alpha.calls(), 4);

        // Partial results are never cached
        let full = service.get_forecast(&request).await.unwrap();
        assert!(!full.cache_hit);
        assert_eq!(full.forecasts.len(), 9);
    }

    #[tokio::test]
    async fn test_progressive_job_reports_every_chunk() {
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(MockProvider::new("ALPHA", 1))];
        let mut config = config();
        config.progressive_threshold = 5;
        config.progressive.chunk_size = 2;
        let service = service(providers, config);

        let request = ForecastRequest::new(route(), settings().with_interval_km(2.5));
        let (reporter, mut rx) = ChannelProgressReporter::channel(16);
        let response = service
            .get_forecast_with_progress(&request, &reporter, &CancellationToken::new())
            .await
            .unwrap();

        assert!(response.is_complete());
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert_eq!(events[4].percentage, 100.0);
    }

    #[tokio::test]
    async fn test_client_quota_is_enforced() {
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(MockProvider::new("ALPHA", 1))];
        let mut config = config();
        config.client_rate_limit = RateLimitConfig::new(1, 10);
        let service = service(providers, config);
        let request = ForecastRequest::new(route(), settings());

        assert!(service.get_forecast_for_client("client-1", &request).await.is_ok());
        match service.get_forecast_for_client("client-1", &request).await {
            Err(Error::RateLimit { key, .. }) => assert_eq!(key, "client-1"),
            other => panic!("expected rate limit error, got {other:?}"),
        }
        assert_eq!(service.client_quota("client-1").count, 0);

        assert!(service.get_forecast_for_client("client-2", &request).await.is_ok());
    }

    #[tokio::test]
    async fn test_imperial_units_local_time_and_alerts() {
        let providers: Vec<Arc<dyn WeatherProvider>> =
            vec![Arc::new(MockProvider::new("ALPHA", 1).with_wind(12.0))];
        let service = service(providers, config());

        let request = ForecastRequest::new(
            route(),
            settings()
                .with_units(Units::Imperial)
                .with_timezone("Europe/Rome"),
        );
        let response = service.get_forecast(&request).await.unwrap();
        let first = &response.forecasts[0];

        let sample = first.primary_sample.as_ref().unwrap();
        assert!((sample.temp - 68.0).abs() < 1e-9);
        assert!((sample.wind_speed - 26.843).abs() < 1e-3);
        assert_eq!(first.local_time.as_deref(), Some("2025-06-01T10:00:00+02:00"));

        // Alerts are evaluated on metric values
        let wind = first
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::HighWind)
            .unwrap();
        assert_eq!(wind.value, 12.0);
    }

    #[tokio::test]
    async fn test_forecast_stream_yields_route_in_order() {
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(MockProvider::new("ALPHA", 1))];
        let mut config = config();
        config.progressive.chunk_size = 2;
        let service = service(providers, config);
        let request = ForecastRequest::new(route(), settings());

        let batches: Vec<_> = service
            .forecast_stream(&request, CancellationToken::new())
            .unwrap()
            .collect()
            .await;

        assert_eq!(batches.len(), 3);
        let total: usize = batches.iter().map(|b| b.as_ref().unwrap().items.len()).sum();
        assert_eq!(total, 5);
        assert_eq!(batches[2].as_ref().unwrap().progress.percentage, 100.0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries_and_active_clients() {
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(MockProvider::new("ALPHA", 1))];
        let service = service(providers, config());
        service
            .get_forecast_for_client("client-1", &ForecastRequest::new(route(), settings()))
            .await
            .unwrap();
        let quota = service.client_quota("client-1");

        assert_eq!(service.sweep_cache().await, 0);
        assert_eq!(service.cache_stats().writes, 1);
        // Active clients keep their counters across a sweep
        assert_eq!(service.client_limiter().tracked_keys(), 1);
        assert_eq!(service.client_quota("client-1"), quota);
    }
}
