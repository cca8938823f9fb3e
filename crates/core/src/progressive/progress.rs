//! Progress reporting for chunked forecast jobs.
//!
//! Reporters are synchronous and must not block the job; the channel
//! reporter drops events when its consumer falls behind.

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Emitted after each completed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Chunks completed so far
    pub current: usize,
    pub total: usize,
    /// 0..=100
    pub percentage: f64,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            100.0 * current as f64 / total as f64
        };
        Self {
            current,
            total,
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Trait for reporting job progress.
///
/// Implementations can emit events to a UI, a websocket, or a log.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// A no-op progress reporter for when progress reporting is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards events to a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelProgressReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressReporter {
    /// Create a reporter and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Err(e) = self.tx.try_send(*event) {
            debug!("Progress event {}/{} dropped: {}", event.current, event.total, e);
        }
    }
}
