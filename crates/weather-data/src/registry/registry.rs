//! Provider registry for orchestrating weather providers.
//!
//! The registry owns every enabled provider and wraps each call with:
//! - Local quota gating via the [`RateLimiter`] (fail-closed, no network call)
//! - Timeouts and retries via the [`retry`](crate::retry) executor
//! - Sample validation
//!
//! Single-source requests go to the highest-priority provider; multi-source
//! requests fan out to every selected provider concurrently and return one
//! outcome per provider so that failures stay isolated.

use std::borrow::Cow;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};

use super::{RateLimiter, SampleValidator};
use crate::errors::WeatherDataError;
use crate::models::{Coordinates, ProviderId, WeatherSample};
use crate::provider::WeatherProvider;
use crate::retry::{execute, RetryPolicy};

/// The settled result of one provider call.
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub provider_id: ProviderId,
    pub result: Result<WeatherSample, WeatherDataError>,
}

/// Provider registry for orchestrating weather fetching.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn WeatherProvider>>,
    rate_limiter: RateLimiter,
    retry_policy: RetryPolicy,
    validator: SampleValidator,
}

impl ProviderRegistry {
    /// Create a new provider registry with the default retry policy.
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Self {
        Self::with_config(providers, RateLimiter::new(), RetryPolicy::default())
    }

    /// Create a registry with custom configuration.
    ///
    /// Each provider's declared [`RateLimit`](crate::provider::RateLimit) is
    /// installed into `rate_limiter`.
    pub fn with_config(
        mut providers: Vec<Arc<dyn WeatherProvider>>,
        rate_limiter: RateLimiter,
        retry_policy: RetryPolicy,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());

        for provider in &providers {
            rate_limiter.configure(provider.id(), provider.rate_limit().into());
        }

        info!(
            "Provider registry initialized with {} provider(s): {:?}",
            providers.len(),
            providers.iter().map(|p| p.id()).collect::<Vec<_>>()
        );

        Self {
            providers,
            rate_limiter,
            retry_policy,
            validator: SampleValidator::new(),
        }
    }

    /// Fetch from one provider, honouring its quota and the retry policy.
    ///
    /// Every attempt, retries included, reserves a quota slot before it goes
    /// to the network. Once the quota is exhausted the attempt fails with
    /// [`WeatherDataError::QuotaExceeded`] and is not retried.
    pub async fn fetch_from(
        &self,
        provider: &Arc<dyn WeatherProvider>,
        coords: Coordinates,
    ) -> Result<WeatherSample, WeatherDataError> {
        let provider_id = provider.id();
        let policy = &self.retry_policy;

        let sample = execute(policy, |e| policy.should_retry(e), || async move {
            if let Err(e) = self.rate_limiter.try_acquire(provider_id) {
                warn!("Skipping {}: {}", provider_id, e);
                return Err(e);
            }
            provider.fetch_current(coords).await
        })
        .await
        .map_err(|e| {
            debug!("{} failed at {}: {}", provider_id, coords, e);
            e.into_weather_error(provider_id)
        })?;

        self.validator.validate(&sample)?;

        Ok(sample)
    }

    /// Single-source fetch from the highest-priority provider.
    pub async fn fetch_primary(&self, coords: Coordinates) -> ProviderOutcome {
        match self.providers.first() {
            Some(provider) => ProviderOutcome {
                provider_id: Cow::Borrowed(provider.id()),
                result: self.fetch_from(provider, coords).await,
            },
            None => ProviderOutcome {
                provider_id: Cow::Borrowed("NONE"),
                result: Err(WeatherDataError::NoProvidersAvailable),
            },
        }
    }

    /// Multi-source fetch.
    ///
    /// Dispatches to every provider in `only` (or every registered provider
    /// when `None`) concurrently and waits for all of them to settle. Outcomes
    /// are returned in priority order.
    pub async fn fetch_all(
        &self,
        coords: Coordinates,
        only: Option<&[ProviderId]>,
    ) -> Result<Vec<ProviderOutcome>, WeatherDataError> {
        let selected: Vec<&Arc<dyn WeatherProvider>> = self
            .providers
            .iter()
            .filter(|p| only.map_or(true, |ids| ids.iter().any(|id| id == p.id())))
            .collect();

        if selected.is_empty() {
            return Err(WeatherDataError::NoProvidersAvailable);
        }

        let outcomes = join_all(selected.into_iter().map(|provider| async move {
            ProviderOutcome {
                provider_id: Cow::Borrowed(provider.id()),
                result: self.fetch_from(provider, coords).await,
            }
        }))
        .await;

        Ok(outcomes)
    }

    /// Registered provider ids, highest priority first.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .map(|p| Cow::Borrowed(p.id()))
            .collect()
    }

    /// Get the list of registered providers.
    pub fn providers(&self) -> &[Arc<dyn WeatherProvider>] {
        &self.providers
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}
