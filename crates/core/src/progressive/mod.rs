//! Progressive processing of long routes.

mod coordinator;
mod progress;
mod stream;

pub use coordinator::{
    should_chunk, ProgressiveChunkCoordinator, ProgressiveConfig, ProgressiveOutcome,
};
pub use progress::{
    ChannelProgressReporter, NoOpProgressReporter, ProgressEvent, ProgressReporter,
};
pub use stream::ChunkBatch;
