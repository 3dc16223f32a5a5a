//! Extractor for the flat `persons` and `genres` indexes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use film_sync_repository::{DirectoryQuery, PageCursor, SourceError, SourceReader, SourceTable};
use film_sync_shared::{min_watermark, DirectoryRecord, WatermarkKey};
use tracing::debug;

use super::{ExtractedBatch, Extractor};
use crate::errors::SyncError;
use crate::orchestrator::{RunPhase, StatusReporter};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::state::PipelineState;

/// Pages a person or genre table by `(modified, id)` from its own watermark.
pub struct DirectoryExtractor {
    source: Arc<dyn SourceReader>,
    table: SourceTable,
    key: WatermarkKey,
    page_size: usize,
    retry: RetryPolicy,
    since: DateTime<Utc>,
    cursor: Option<PageCursor>,
    drained: bool,
}

impl DirectoryExtractor {
    pub fn new(
        source: Arc<dyn SourceReader>,
        table: SourceTable,
        key: WatermarkKey,
        page_size: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            table,
            key,
            page_size: page_size.max(1),
            retry,
            since: min_watermark(),
            cursor: None,
            drained: true,
        }
    }

    pub fn persons(source: Arc<dyn SourceReader>, page_size: usize, retry: RetryPolicy) -> Self {
        Self::new(
            source,
            SourceTable::Person,
            WatermarkKey::PersonDirectory,
            page_size,
            retry,
        )
    }

    pub fn genres(source: Arc<dyn SourceReader>, page_size: usize, retry: RetryPolicy) -> Self {
        Self::new(
            source,
            SourceTable::Genre,
            WatermarkKey::GenreDirectory,
            page_size,
            retry,
        )
    }
}

#[async_trait]
impl Extractor for DirectoryExtractor {
    type Item = DirectoryRecord;

    async fn pre_check(&self) -> Result<(), SyncError> {
        self.source
            .ping()
            .await
            .map_err(|e| SyncError::pre_check(format!("Source database is unreachable: {}", e)))
    }

    fn start(&mut self, state: &PipelineState) {
        self.since = state.watermark(self.key);
        self.cursor = None;
        self.drained = false;
    }

    async fn next_batch(
        &mut self,
        status: &StatusReporter,
    ) -> Result<Option<ExtractedBatch<DirectoryRecord>>, SyncError> {
        if self.drained {
            return Ok(None);
        }
        status.phase(RunPhase::Extracting);

        let query = DirectoryQuery {
            table: self.table,
            since: self.since,
            after: self.cursor,
            limit: self.page_size,
        };
        let source = self.source.as_ref();
        let records = retry_with_backoff(
            &self.retry,
            "fetch_directory",
            || source.fetch_directory(&query),
            SourceError::is_transient,
        )
        .await?;

        if records.len() < self.page_size {
            self.drained = true;
        }
        let Some(last) = records.last() else {
            return Ok(None);
        };

        let high_watermark = last.modified;
        self.cursor = Some(PageCursor::for_entity(last.modified, last.id));

        debug!(
            table = self.table.as_str(),
            rows = records.len(),
            high_watermark = %high_watermark,
            "Fetched directory page"
        );

        Ok(Some(ExtractedBatch {
            key: self.key,
            high_watermark,
            rows: records.len(),
            items: records,
        }))
    }
}
