//! Extract stage: turns watermarks into batches of changed source rows.
//!
//! - [`EntitySyncWorker`]: one change feed (person, genre or work) and its watermark
//! - [`FilmWorkExtractor`]: runs the three workers in order and enriches each page
//! - [`DirectoryExtractor`]: pages a flat person or genre table

mod directory;
mod film_work;
mod worker;

pub use directory::DirectoryExtractor;
pub use film_work::FilmWorkExtractor;
pub use worker::{EntitySyncWorker, WorkerKind, WorkerPage};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use film_sync_shared::WatermarkKey;

use crate::errors::SyncError;
use crate::orchestrator::StatusReporter;
use crate::state::PipelineState;

/// One unit of work handed downstream.
///
/// Once every item has been loaded, `key` may advance to `high_watermark`.
/// A batch with no items still carries a watermark, which is how the no-data
/// fallback moves a stalled feed forward.
#[derive(Debug, Clone)]
pub struct ExtractedBatch<T> {
    pub key: WatermarkKey,
    pub high_watermark: DateTime<Utc>,
    /// Source rows behind this batch, before de-duplication.
    pub rows: usize,
    pub items: Vec<T>,
}

/// Source side of a pipeline.
///
/// Stateful within an iteration: `start` snapshots the watermarks to compare
/// against, then `next_batch` is called until it returns `None`.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Item: Send + 'static;

    /// Startup check that the source answers.
    async fn pre_check(&self) -> Result<(), SyncError>;

    /// Reset paging and snapshot the watermarks for a new iteration.
    fn start(&mut self, state: &PipelineState);

    /// Fetch the next batch, or `None` when every feed is drained.
    async fn next_batch(
        &mut self,
        status: &StatusReporter,
    ) -> Result<Option<ExtractedBatch<Self::Item>>, SyncError>;
}
