//! Periodic housekeeping for cache backends.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backend::CacheBackend;

/// Sweep expired entries from `backend` every `interval` until `cancel` fires.
pub fn spawn_sweeper(
    backend: Arc<dyn CacheBackend>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    spawn_sweeper_with(backend, interval, cancel, || {})
}

/// Like [`spawn_sweeper`], running `after_sweep` after every pass.
pub fn spawn_sweeper_with<F>(
    backend: Arc<dyn CacheBackend>,
    interval: Duration,
    cancel: CancellationToken,
    after_sweep: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match backend.sweep_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!("Cache sweeper removed {} expired entries", removed),
                        Err(e) => warn!("Cache sweep failed: {}", e),
                    }
                    after_sweep();
                }
            }
        }
    })
}
