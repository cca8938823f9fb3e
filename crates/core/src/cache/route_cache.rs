//! Long-lived cache of parsed routes, keyed by the source bytes.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use super::backend::CacheBackend;
use super::key::route_cache_key;
use crate::constants::DEFAULT_ROUTE_TTL_SECS;
use crate::errors::Result;
use crate::routes::Route;

pub struct RouteCache {
    backend: Arc<dyn CacheBackend>,
    /// `None` keeps routes until evicted explicitly
    ttl: Option<Duration>,
}

impl RouteCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Option<Duration>) -> Self {
        Self { backend, ttl }
    }

    pub fn with_default_ttl(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, Some(Duration::from_secs(DEFAULT_ROUTE_TTL_SECS)))
    }

    /// The route previously parsed from `source`, if cached.
    pub async fn get(&self, source: &[u8]) -> Option<Route> {
        let key = route_cache_key(source);
        let stored = match self.backend.get(&key).await {
            Ok(stored) => stored?,
            Err(e) => {
                warn!("Route cache lookup failed, treating as miss: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<Route>(&stored.bytes) {
            Ok(route) => {
                if let Err(e) = self.backend.touch(&key).await {
                    warn!("Failed to bump access time of {}: {}", key, e);
                }
                Some(route)
            }
            Err(e) => {
                warn!("Discarding undecodable route cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Cache `route` as the parse result of `source`. Best-effort.
    pub async fn put(&self, source: &[u8], route: &Route) {
        let key = route_cache_key(source);
        let bytes = match serde_json::to_vec(route) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode route {}: {}", route.name, e);
                return;
            }
        };
        if let Err(e) = self.backend.set(&key, bytes, self.ttl).await {
            warn!("Route cache write failed for {}: {}", key, e);
        }
    }

    /// Return the cached parse of `source`, or parse and cache it.
    ///
    /// Parse errors propagate and nothing is cached.
    pub async fn get_or_parse<F>(&self, source: &[u8], parse: F) -> Result<Route>
    where
        F: FnOnce(&[u8]) -> Result<Route>,
    {
        if let Some(route) = self.get(source).await {
            debug!("Route cache hit for '{}'", route.name);
            return Ok(route);
        }

        let route = parse(source)?;
        self.put(source, &route).await;
        Ok(route)
    }

    pub async fn sweep(&self) -> usize {
        self.backend.sweep_expired().await.unwrap_or_else(|e| {
            warn!("Route cache sweep failed: {}", e);
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheBackend;
    use crate::errors::{Error, ValidationError};
    use crate::routes::RawPoint;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parse_ok(_: &[u8]) -> Result<Route> {
        Ok(Route::new(
            "Col du Galibier",
            vec![RawPoint::new(45.06, 6.41), RawPoint::new(45.07, 6.42)],
        ))
    }

    #[tokio::test]
    async fn test_parses_once_per_source() {
        let cache = RouteCache::with_default_ttl(Arc::new(MemoryCacheBackend::new()));
        let parses = AtomicUsize::new(0);

        for _ in 0..3 {
            let route = cache
                .get_or_parse(b"<gpx>galibier</gpx>", |src| {
                    parses.fetch_add(1, Ordering::SeqCst);
                    parse_ok(src)
                })
                .await
                .unwrap();
            assert_eq!(route.name, "Col du Galibier");
        }

        assert_eq!(parses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_source_is_a_different_entry() {
        let cache = RouteCache::new(Arc::new(MemoryCacheBackend::new()), None);
        cache.put(b"a", &parse_ok(b"a").unwrap()).await;

        assert!(cache.get(b"a").await.is_some());
        assert!(cache.get(b"b").await.is_none());
    }

    #[tokio::test]
    async fn test_parse_error_is_not_cached() {
        let cache = RouteCache::with_default_ttl(Arc::new(MemoryCacheBackend::new()));

        let err = cache
            .get_or_parse(b"<gpx/>", |_| Err(ValidationError::TooFewPoints(0).into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(cache.get(b"<gpx/>").await.is_none());
    }
}
