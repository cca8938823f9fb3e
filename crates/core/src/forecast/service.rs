//! Route forecast service.
//!
//! This module ties the pipeline together for one request:
//! - Validation of the route and settings
//! - Content-addressed cache lookup
//! - Sampling and arrival-time scheduling
//! - Per-point provider fetches (single or multi-source) with consensus
//! - Alerts, unit conversion, caching of complete results
//!
//! Routes with more sample points than the configured threshold are handed to
//! the [`ProgressiveChunkCoordinator`]; shorter routes are fetched in one go.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use routecast_weather_data::{
    ConsensusAggregator, ProviderOutcome, ProviderRegistry, Quota, RateLimiter, WeatherDataError,
};

use super::model::{
    ForecastRequest, ForecastResponse, ForecastStatus, ProviderFailure, WeatherForecast,
};
use super::units::apply_units;
use crate::alerts::AlertInputs;
use crate::cache::{
    forecast_cache_key, spawn_sweeper_with, CacheBackend, CacheStats, ForecastCache,
    MemoryCacheBackend, RouteCache,
};
use crate::errors::{Error, Result};
use crate::progressive::{
    should_chunk, ChunkBatch, NoOpProgressReporter, ProgressiveChunkCoordinator,
    ProgressReporter,
};
use crate::routes::{RoutePoint, RouteSampler};
use crate::settings::{ForecastMode, ServiceConfig};

/// Public contract of the forecast pipeline.
#[async_trait]
pub trait WeatherForecastServiceTrait: Send + Sync {
    /// Forecast every sample point of a route.
    async fn get_forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse>;

    /// Like [`get_forecast`](Self::get_forecast), reporting progress for
    /// chunked routes and stopping between chunks once `cancel` fires.
    async fn get_forecast_with_progress(
        &self,
        request: &ForecastRequest,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ForecastResponse>;

    /// Forecast on behalf of a client, subject to its inbound quota.
    async fn get_forecast_for_client(
        &self,
        client_id: &str,
        request: &ForecastRequest,
    ) -> Result<ForecastResponse>;

    /// Remaining inbound quota for a client.
    fn client_quota(&self, client_id: &str) -> Quota;

    fn cache_stats(&self) -> CacheStats;

    /// Drop expired forecast and route entries. Returns how many were removed.
    async fn sweep_cache(&self) -> usize;
}

pub struct WeatherForecastService {
    registry: Arc<ProviderRegistry>,
    forecast_cache: ForecastCache,
    route_cache: RouteCache,
    client_limiter: Arc<RateLimiter>,
    coordinator: ProgressiveChunkCoordinator,
    aggregator: ConsensusAggregator,
    config: ServiceConfig,
}

impl WeatherForecastService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        forecast_cache: ForecastCache,
        route_cache: RouteCache,
        config: ServiceConfig,
    ) -> Self {
        let aggregator = ConsensusAggregator::new(registry.provider_ids());
        Self {
            client_limiter: Arc::new(RateLimiter::with_default_config(config.client_rate_limit)),
            coordinator: ProgressiveChunkCoordinator::new(config.progressive.clone()),
            aggregator,
            registry,
            forecast_cache,
            route_cache,
            config,
        }
    }

    /// Service backed by one in-memory store for forecasts and routes, with
    /// TTLs taken from `config`.
    pub fn in_memory(registry: Arc<ProviderRegistry>, config: ServiceConfig) -> Self {
        let backend: Arc<dyn CacheBackend> = Arc::new(MemoryCacheBackend::new());
        Self::new(
            registry,
            ForecastCache::new(backend.clone(), config.forecast_ttl),
            RouteCache::new(backend, config.route_ttl),
            config,
        )
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn route_cache(&self) -> &RouteCache {
        &self.route_cache
    }

    pub fn forecast_cache(&self) -> &ForecastCache {
        &self.forecast_cache
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Sweep the forecast cache backend and prune idle client quotas every
    /// `sweep_interval` until `cancel` fires.
    pub fn spawn_cache_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let clients = self.client_limiter.clone();
        spawn_sweeper_with(
            self.forecast_cache.backend().clone(),
            self.config.sweep_interval,
            cancel,
            move || {
                clients.prune_idle();
            },
        )
    }

    /// Inbound per-client limiter.
    pub fn client_limiter(&self) -> &RateLimiter {
        &self.client_limiter
    }

    /// Validate the request and produce its scheduled sample points.
    fn plan(&self, request: &ForecastRequest) -> Result<(Vec<RoutePoint>, Tz)> {
        request.route.validate()?;
        request.settings.validate()?;
        let tz = request.settings.tz()?;

        let sampler = RouteSampler::new(request.settings.interval_km)?;
        let points = request.route.route_points();
        let samples = sampler.sample_with_schedule(&points, &request.settings)?;
        Ok((samples, tz))
    }

    /// Stream forecasts chunk by chunk without touching the cache.
    ///
    /// The stream is lazy: each chunk is fetched when polled, and dropping the
    /// stream abandons the rest of the route.
    pub fn forecast_stream<'a>(
        &'a self,
        request: &'a ForecastRequest,
        cancel: CancellationToken,
    ) -> Result<impl Stream<Item = Result<ChunkBatch<WeatherForecast>>> + 'a> {
        let (samples, tz) = self.plan(request)?;
        Ok(self.coordinator.stream(
            &samples,
            move |chunk| self.process_points(chunk, request, tz),
            cancel,
        ))
    }

    /// Fetch a batch of points with bounded concurrency, preserving order.
    ///
    /// Fails only when no point in the batch produced data: with a retryable
    /// error if any provider failure was transient, otherwise with
    /// [`Error::AllProvidersFailed`].
    async fn process_points(
        &self,
        points: Vec<RoutePoint>,
        request: &ForecastRequest,
        tz: Tz,
    ) -> Result<Vec<WeatherForecast>> {
        let count = points.len();
        let forecasts: Vec<WeatherForecast> = stream::iter(
            points
                .into_iter()
                .map(|point| self.forecast_point(point, request, tz)),
        )
        .buffered(self.config.point_concurrency.max(1))
        .collect()
        .await;

        if count > 0 && forecasts.iter().all(WeatherForecast::is_failed) {
            let transient = forecasts
                .iter()
                .flat_map(|f| f.provider_errors.iter())
                .any(|e| e.kind.is_transient());
            return Err(if transient {
                Error::Upstream(format!("no provider answered for any of {} point(s)", count))
            } else {
                Error::AllProvidersFailed { points: count }
            });
        }

        Ok(forecasts)
    }

    async fn fetch_outcomes(
        &self,
        point: &RoutePoint,
        request: &ForecastRequest,
    ) -> Vec<ProviderOutcome> {
        let coords = point.coordinates();
        match request.preferences.mode {
            ForecastMode::Single => vec![self.registry.fetch_primary(coords).await],
            ForecastMode::Multi => {
                let only = request.preferences.providers.as_deref();
                match self.registry.fetch_all(coords, only).await {
                    Ok(outcomes) => outcomes,
                    Err(e) => vec![ProviderOutcome {
                        provider_id: Cow::Borrowed("NONE"),
                        result: Err(e),
                    }],
                }
            }
        }
    }

    /// Forecast one point. Provider failures are recorded, never raised.
    async fn forecast_point(
        &self,
        point: RoutePoint,
        request: &ForecastRequest,
        tz: Tz,
    ) -> WeatherForecast {
        let outcomes = self.fetch_outcomes(&point, request).await;

        let mut samples = Vec::with_capacity(outcomes.len());
        let mut provider_errors = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(sample) => samples.push(sample),
                Err(e) => provider_errors.push(ProviderFailure::new(outcome.provider_id, &e)),
            }
        }

        let status = if samples.is_empty() {
            warn!(
                "No provider produced data at {:.3} km ({} failure(s))",
                point.distance_km,
                provider_errors.len()
            );
            ForecastStatus::Failed
        } else if provider_errors.is_empty() {
            ForecastStatus::Ok
        } else {
            ForecastStatus::Degraded
        };

        let consensus = match request.preferences.mode {
            ForecastMode::Multi if !samples.is_empty() => {
                match self.aggregator.aggregate(&samples) {
                    Ok(consensus) => Some(consensus),
                    Err(e) => {
                        warn!("Consensus failed at {:.3} km: {}", point.distance_km, e);
                        None
                    }
                }
            }
            _ => None,
        };

        let primary_sample = samples.first().cloned();
        let alerts = match (&consensus, &primary_sample) {
            (Some(c), Some(primary)) => self
                .config
                .alert_thresholds
                .evaluate(&AlertInputs::from_consensus(c, primary)),
            (None, Some(primary)) => self
                .config
                .alert_thresholds
                .evaluate(&AlertInputs::from_sample(primary)),
            (_, None) => Vec::new(),
        };

        let local_time = point
            .estimated_time
            .map(|t| t.with_timezone(&tz).to_rfc3339());

        let mut forecast = WeatherForecast {
            route_point: point,
            status,
            primary_sample,
            all_samples: samples,
            consensus,
            alerts,
            provider_errors,
            local_time,
        };
        apply_units(&mut forecast, request.settings.units);
        forecast
    }

    async fn compute(
        &self,
        request: &ForecastRequest,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ForecastResponse> {
        request.route.validate()?;
        request.settings.validate()?;

        let key = forecast_cache_key(
            &request.route.route_points(),
            &request.settings,
            &request.preferences,
        );
        if let Some(entry) = self.forecast_cache.get(&key).await {
            debug!("Serving '{}' from cache", request.route.name);
            let total = entry.forecasts.len();
            let mut response = ForecastResponse::new(entry.forecasts, total);
            response.cache_hit = true;
            return Ok(response);
        }

        let (samples, tz) = self.plan(request)?;
        let total = samples.len();

        let response = if should_chunk(total, self.config.progressive_threshold) {
            info!(
                "Route '{}' has {} sample point(s), loading progressively",
                request.route.name, total
            );
            let outcome = self
                .coordinator
                .run(
                    &samples,
                    |chunk| self.process_points(chunk, request, tz),
                    reporter,
                    cancel,
                )
                .await;

            if let Some(failure) = outcome.failure {
                if outcome.forecasts.is_empty() {
                    return Err(match failure {
                        Error::Upstream(_) => Error::AllProvidersFailed { points: total },
                        other => other,
                    });
                }
                let mut response = ForecastResponse::new(outcome.forecasts, total);
                response.failure = Some(failure.to_string());
                response.cancelled = outcome.cancelled;
                response
            } else {
                let mut response = ForecastResponse::new(outcome.forecasts, total);
                response.cancelled = outcome.cancelled;
                response
            }
        } else if cancel.is_cancelled() {
            let mut response = ForecastResponse::new(Vec::new(), total);
            response.cancelled = true;
            response
        } else {
            let forecasts = self
                .process_points(samples, request, tz)
                .await
                .map_err(|_| Error::AllProvidersFailed { points: total })?;
            ForecastResponse::new(forecasts, total)
        };

        if response.failed_points > 0 {
            warn!(
                "Route '{}': {}/{} point(s) failed",
                request.route.name, response.failed_points, total
            );
        }

        if response.is_complete() {
            self.forecast_cache.set(&key, &response.forecasts).await;
        } else {
            debug!(
                "Not caching partial result for '{}' ({}/{} delivered)",
                request.route.name,
                response.forecasts.len(),
                total
            );
        }

        Ok(response)
    }
}

#[async_trait]
impl WeatherForecastServiceTrait for WeatherForecastService {
    async fn get_forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.compute(request, &NoOpProgressReporter, &CancellationToken::new())
            .await
    }

    async fn get_forecast_with_progress(
        &self,
        request: &ForecastRequest,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ForecastResponse> {
        self.compute(request, reporter, cancel).await
    }

    async fn get_forecast_for_client(
        &self,
        client_id: &str,
        request: &ForecastRequest,
    ) -> Result<ForecastResponse> {
        self.client_limiter
            .try_acquire(client_id)
            .map_err(|e| match e {
                WeatherDataError::QuotaExceeded { provider, reset_at } => Error::RateLimit {
                    key: provider,
                    reset_at,
                },
                other => Error::from(other),
            })?;
        self.get_forecast(request).await
    }

    fn client_quota(&self, client_id: &str) -> Quota {
        self.client_limiter.remaining(client_id)
    }

    fn cache_stats(&self) -> CacheStats {
        self.forecast_cache.stats()
    }

    async fn sweep_cache(&self) -> usize {
        let removed = self.forecast_cache.sweep().await + self.route_cache.sweep().await;
        if removed > 0 {
            info!("Cache sweep removed {} expired entr(ies)", removed);
        }
        let pruned = self.client_limiter.prune_idle();
        if pruned > 0 {
            info!("Pruned quota state for {} idle client(s)", pruned);
        }
        removed
    }
}
