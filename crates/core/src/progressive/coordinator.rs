//! Chunked, cancellable processing of large routes.
//!
//! Points are split into fixed-size chunks processed strictly one after the
//! other, with a pause between chunks so that provider quotas shared across
//! the whole request are not burst. Each chunk goes through the retry
//! executor. A chunk that exhausts its retries stops the job; everything
//! completed before it is kept in the outcome.
//!
//! Cancellation is cooperative and checked between chunks. A chunk that is
//! already running finishes and its results are kept.

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use routecast_weather_data::{execute, AttemptError, ExecutionError, RetryPolicy};

use super::progress::{ProgressEvent, ProgressReporter};
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_INTER_CHUNK_DELAY_MS};
use crate::errors::Error;
use crate::routes::RoutePoint;

/// Whether a route with `sample_count` points should be chunked.
pub fn should_chunk(sample_count: usize, threshold: usize) -> bool {
    sample_count > threshold
}

#[derive(Debug, Clone)]
pub struct ProgressiveConfig {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
    /// Retry policy applied to each chunk as a whole
    pub chunk_policy: RetryPolicy,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: Duration::from_millis(DEFAULT_INTER_CHUNK_DELAY_MS),
            // Provider calls inside a chunk carry their own retries and timeouts
            chunk_policy: RetryPolicy::new(1, Duration::from_secs(120)),
        }
    }
}

/// Result of a progressive job.
#[derive(Debug)]
pub struct ProgressiveOutcome<T> {
    /// Results of every completed chunk, in route order
    pub forecasts: Vec<T>,
    pub cancelled: bool,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    /// Set when a chunk exhausted its retries
    pub failure: Option<Error>,
}

impl<T> ProgressiveOutcome<T> {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failure.is_none() && self.completed_chunks == self.total_chunks
    }
}

pub struct ProgressiveChunkCoordinator {
    config: ProgressiveConfig,
}

impl ProgressiveChunkCoordinator {
    pub fn new(config: ProgressiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgressiveConfig {
        &self.config
    }

    pub(crate) fn chunks(&self, points: &[RoutePoint]) -> Vec<Vec<RoutePoint>> {
        points
            .chunks(self.config.chunk_size.max(1))
            .map(|c| c.to_vec())
            .collect()
    }

    /// Process `points` chunk by chunk.
    pub async fn run<T, F, Fut>(
        &self,
        points: &[RoutePoint],
        processor: F,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> ProgressiveOutcome<T>
    where
        F: Fn(Vec<RoutePoint>) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let chunks = self.chunks(points);
        let total_chunks = chunks.len();
        let mut outcome = ProgressiveOutcome {
            forecasts: Vec::with_capacity(points.len()),
            cancelled: false,
            completed_chunks: 0,
            total_chunks,
            failure: None,
        };

        info!(
            "Progressive job: {} point(s) in {} chunk(s) of {}",
            points.len(),
            total_chunks,
            self.config.chunk_size
        );

        for (index, chunk) in chunks.into_iter().enumerate() {
            if index > 0 && !self.pause(cancel).await {
                outcome.cancelled = true;
            }
            if outcome.cancelled || cancel.is_cancelled() {
                outcome.cancelled = true;
                info!(
                    "Progressive job cancelled after {}/{} chunk(s)",
                    outcome.completed_chunks, total_chunks
                );
                break;
            }

            match self.process_chunk(index, &chunk, &processor).await {
                Ok(mut results) => {
                    outcome.forecasts.append(&mut results);
                    outcome.completed_chunks += 1;
                    reporter.report(&ProgressEvent::new(outcome.completed_chunks, total_chunks));
                }
                Err(e) => {
                    warn!("Chunk {} of {} failed, stopping job: {}", index + 1, total_chunks, e);
                    outcome.failure = Some(e);
                    break;
                }
            }
        }

        outcome
    }

    /// Run one chunk through the retry executor.
    pub(crate) async fn process_chunk<T, F, Fut>(
        &self,
        index: usize,
        chunk: &[RoutePoint],
        processor: &F,
    ) -> Result<Vec<T>, Error>
    where
        F: Fn(Vec<RoutePoint>) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        debug!("Processing chunk {} ({} point(s))", index + 1, chunk.len());

        execute(
            &self.config.chunk_policy,
            |e: &AttemptError<Error>| match e {
                AttemptError::Timeout(_) => true,
                AttemptError::Operation(e) => e.is_retryable(),
            },
            || processor(chunk.to_vec()),
        )
        .await
        .map_err(|e| chunk_error(index, e))
    }

    /// Wait out the inter-chunk delay. Returns false if cancelled meanwhile.
    pub(crate) async fn pause(&self, cancel: &CancellationToken) -> bool {
        if self.config.inter_chunk_delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.inter_chunk_delay) => true,
        }
    }
}

fn chunk_error(index: usize, error: ExecutionError<Error>) -> Error {
    match error.last {
        AttemptError::Operation(e) => e,
        AttemptError::Timeout(d) => Error::Timeout(format!(
            "chunk {} timed out after {:?} ({} attempt(s))",
            index + 1,
            d,
            error.attempts
        )),
    }
}
