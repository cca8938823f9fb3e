//! Minimal key-value interface the caches are built on.
//!
//! Any store with get/set/delete and TTL support can back the caches; the
//! in-memory [`MemoryCacheBackend`](super::MemoryCacheBackend) is provided.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;

/// A stored value with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
    /// `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
}

impl StoredValue {
    pub fn new(bytes: Vec<u8>, ttl: Option<Duration>, now: DateTime<Utc>) -> Self {
        let expires_at = ttl
            .and_then(|t| chrono::Duration::from_std(t).ok())
            .map(|t| now + t);
        Self {
            bytes,
            created_at: now,
            expires_at,
            last_accessed: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Storage backend for the forecast and route caches.
///
/// Expiry is lazy: `get` never returns an expired value and removes it.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Bump `last_accessed`.
    async fn touch(&self, key: &str) -> Result<()>;

    /// Remove every expired value, returning how many were removed.
    async fn sweep_expired(&self) -> Result<usize>;

    /// Number of stored values, expired ones included.
    async fn len(&self) -> Result<usize>;
}
