//! Pull-based variant of the coordinator.
//!
//! Each chunk is fetched only when the consumer polls for it, so a slow
//! consumer throttles the job and dropping the stream cancels it.

use std::future::Future;

use futures::stream::{self, Stream};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::coordinator::ProgressiveChunkCoordinator;
use super::progress::ProgressEvent;
use crate::errors::Error;
use crate::routes::RoutePoint;

/// One completed chunk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkBatch<T> {
    /// Zero-based chunk index
    pub index: usize,
    pub items: Vec<T>,
    pub progress: ProgressEvent,
}

struct StreamState<F> {
    chunks: Vec<Vec<RoutePoint>>,
    next: usize,
    processor: F,
    finished: bool,
}

impl ProgressiveChunkCoordinator {
    /// Stream chunk results in route order.
    ///
    /// The stream ends after the last chunk, after the first chunk that
    /// exhausts its retries (yielded as `Err`), or when `cancel` fires.
    pub fn stream<'a, T, F, Fut>(
        &'a self,
        points: &[RoutePoint],
        processor: F,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<ChunkBatch<T>, Error>> + 'a
    where
        T: 'a,
        F: Fn(Vec<RoutePoint>) -> Fut + 'a,
        Fut: Future<Output = Result<Vec<T>, Error>> + 'a,
    {
        let state = StreamState {
            chunks: self.chunks(points),
            next: 0,
            processor,
            finished: false,
        };

        stream::unfold(state, move |mut state| {
            let cancel = cancel.clone();
            async move {
                if state.finished || state.next >= state.chunks.len() {
                    return None;
                }
                if state.next > 0 && !self.pause(&cancel).await {
                    return None;
                }
                if cancel.is_cancelled() {
                    return None;
                }

                let index = state.next;
                let total = state.chunks.len();
                let result = self
                    .process_chunk(index, &state.chunks[index], &state.processor)
                    .await;
                state.next += 1;

                let item = match result {
                    Ok(items) => Ok(ChunkBatch {
                        index,
                        items,
                        progress: ProgressEvent::new(index + 1, total),
                    }),
                    Err(e) => {
                        state.finished = true;
                        Err(e)
                    }
                };
                Some((item, state))
            }
        })
    }
}
