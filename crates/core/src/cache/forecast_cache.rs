//! Short-lived cache of computed route forecasts.
//!
//! Every operation is best-effort: a backend or decoding failure is logged,
//! counted and reported as a miss, never as an error to the request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::backend::CacheBackend;
use crate::constants::DEFAULT_FORECAST_TTL_SECS;
use crate::forecast::WeatherForecast;

/// A cached forecast set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub forecasts: Vec<WeatherForecast>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    /// Hits over lookups, 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

pub struct ForecastCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    counters: Counters,
}

impl ForecastCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            counters: Counters::default(),
        }
    }

    /// Cache with the default 30 minute TTL.
    pub fn with_default_ttl(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, Duration::from_secs(DEFAULT_FORECAST_TTL_SECS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Look up a forecast set. Expired, unreadable and unreachable entries are misses.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let stored = match self.backend.get(key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Forecast cache miss for {}", key);
                return None;
            }
            Err(e) => {
                self.record_error();
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Forecast cache lookup failed, treating as miss: {}", e);
                return None;
            }
        };

        let forecasts: Vec<WeatherForecast> = match serde_json::from_slice(&stored.bytes) {
            Ok(forecasts) => forecasts,
            Err(e) => {
                self.record_error();
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Discarding undecodable forecast cache entry {}: {}", key, e);
                if let Err(e) = self.backend.delete(key).await {
                    warn!("Failed to delete forecast cache entry {}: {}", key, e);
                }
                return None;
            }
        };

        if let Err(e) = self.backend.touch(key).await {
            self.record_error();
            warn!("Failed to bump access time of {}: {}", key, e);
        }

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!("Forecast cache hit for {}", key);

        Some(CacheEntry {
            key: key.to_string(),
            forecasts,
            created_at: stored.created_at,
            expires_at: stored.expires_at,
            last_accessed: Utc::now(),
        })
    }

    /// Store a forecast set. Failures are logged and swallowed.
    pub async fn set(&self, key: &str, forecasts: &[WeatherForecast]) {
        let bytes = match serde_json::to_vec(forecasts) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.record_error();
                warn!("Failed to encode forecasts for {}: {}", key, e);
                return;
            }
        };

        match self.backend.set(key, bytes, Some(self.ttl)).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                debug!("Cached {} forecast(s) under {}", forecasts.len(), key);
            }
            Err(e) => {
                self.record_error();
                warn!("Forecast cache write failed for {}: {}", key, e);
            }
        }
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        match self.backend.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                self.record_error();
                warn!("Forecast cache delete failed for {}: {}", key, e);
                false
            }
        }
    }

    /// Remove expired entries from the backend.
    pub async fn sweep(&self) -> usize {
        match self.backend.sweep_expired().await {
            Ok(removed) => removed,
            Err(e) => {
                self.record_error();
                warn!("Forecast cache sweep failed: {}", e);
                0
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
    }
}
