use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::debug;

use super::backend::{CacheBackend, StoredValue};
use crate::errors::Result;

/// In-process cache backend on a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, StoredValue>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let now = Utc::now();
        if self
            .entries
            .remove_if(key, |_, value| value.is_expired(now))
            .is_some()
        {
            debug!("Cache entry {} expired", key);
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.entries
            .insert(key.to_string(), StoredValue::new(bytes, ttl, Utc::now()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn touch(&self, key: &str) -> Result<()> {
        if let Some(mut value) = self.entries.get_mut(key) {
            value.last_accessed = Utc::now();
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, value| !value.is_expired(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = MemoryCacheBackend::new();
        backend.set("k", b"v".to_vec(), None).await.unwrap();

        let value = backend.get("k").await.unwrap().unwrap();
        assert_eq!(value.bytes, b"v");
        assert!(value.expires_at.is_none());

        assert!(backend.delete("k").await.unwrap());
        assert!(backend.get("k").await.unwrap().is_none());
        assert!(!backend.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_value_is_a_miss_and_removed() {
        let backend = MemoryCacheBackend::new();
        backend
            .set("k", b"v".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(backend.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(backend.get("k").await.unwrap().is_none());
        assert_eq!(backend.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let backend = MemoryCacheBackend::new();
        backend
            .set("short", b"a".to_vec(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        backend.set("forever", b"b".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(backend.sweep_expired().await.unwrap(), 1);
        assert_eq!(backend.len().await.unwrap(), 1);
        assert!(backend.get("forever").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touch_bumps_last_accessed() {
        let backend = MemoryCacheBackend::new();
        backend.set("k", b"v".to_vec(), None).await.unwrap();
        let before = backend.get("k").await.unwrap().unwrap().last_accessed;

        tokio::time::sleep(Duration::from_millis(5)).await;
        backend.touch("k").await.unwrap();

        let after = backend.get("k").await.unwrap().unwrap().last_accessed;
        assert!(after > before);
    }
}
