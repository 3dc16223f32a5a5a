//! Extractor for the `movies` index.

use std::sync::Arc;

use async_trait::async_trait;
use film_sync_repository::SourceReader;
use film_sync_shared::{EnrichedWork, WatermarkKey};
use tracing::debug;

use super::worker::{EntitySyncWorker, WorkerKind};
use super::{ExtractedBatch, Extractor};
use crate::enricher::Enricher;
use crate::errors::SyncError;
use crate::orchestrator::{RunPhase, StatusReporter};
use crate::retry::RetryPolicy;
use crate::state::PipelineState;

/// Runs the person, genre and work workers strictly in that order, handing each
/// page of ids to the [`Enricher`] before the next page is requested.
pub struct FilmWorkExtractor {
    source: Arc<dyn SourceReader>,
    enricher: Enricher,
    retry: RetryPolicy,
    workers: Vec<EntitySyncWorker>,
    current: usize,
}

impl FilmWorkExtractor {
    pub fn new(source: Arc<dyn SourceReader>, page_size: usize, retry: RetryPolicy) -> Self {
        let enricher = Enricher::new(Arc::clone(&source), retry.clone());
        let workers = WorkerKind::ORDER
            .iter()
            .map(|kind| EntitySyncWorker::new(*kind, page_size))
            .collect();

        Self {
            source,
            enricher,
            retry,
            workers,
            current: 0,
        }
    }
}

#[async_trait]
impl Extractor for FilmWorkExtractor {
    type Item = EnrichedWork;

    async fn pre_check(&self) -> Result<(), SyncError> {
        self.source
            .ping()
            .await
            .map_err(|e| SyncError::pre_check(format!("Source database is unreachable: {}", e)))
    }

    fn start(&mut self, state: &PipelineState) {
        let work_watermark = state.watermark(WatermarkKey::Work);
        for worker in &mut self.workers {
            worker.start(state, work_watermark);
        }
        self.current = 0;
    }

    async fn next_batch(
        &mut self,
        status: &StatusReporter,
    ) -> Result<Option<ExtractedBatch<EnrichedWork>>, SyncError> {
        while let Some(worker) = self.workers.get_mut(self.current) {
            status.phase(RunPhase::Extracting);

            let Some(page) = worker.next_page(self.source.as_ref(), &self.retry).await? else {
                debug!(worker = ?worker.kind(), "Worker drained");
                self.current += 1;
                continue;
            };

            let key = worker.kind().key();
            status.phase(RunPhase::Enriching);
            let items = self.enricher.enrich(&page.work_ids).await?;

            return Ok(Some(ExtractedBatch {
                key,
                high_watermark: page.high_watermark,
                rows: page.rows,
                items,
            }));
        }

        Ok(None)
    }
}
