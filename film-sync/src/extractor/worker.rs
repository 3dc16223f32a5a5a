//! Per-entity change detection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use film_sync_repository::{ChangeFeed, ChangeQuery, PageCursor, SourceError, SourceReader};
use film_sync_shared::{min_watermark, WatermarkKey};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::SyncError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::state::PipelineState;

/// Which change feed a worker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Person,
    Genre,
    Work,
}

impl WorkerKind {
    /// Execution order within an iteration. Person and genre run before work so
    /// they compare against the work watermark of the previous iteration.
    pub const ORDER: [WorkerKind; 3] = [WorkerKind::Person, WorkerKind::Genre, WorkerKind::Work];

    pub fn key(&self) -> WatermarkKey {
        match self {
            WorkerKind::Person => WatermarkKey::Person,
            WorkerKind::Genre => WatermarkKey::Genre,
            WorkerKind::Work => WatermarkKey::Work,
        }
    }

    pub fn feed(&self) -> ChangeFeed {
        match self {
            WorkerKind::Person => ChangeFeed::Person,
            WorkerKind::Genre => ChangeFeed::Genre,
            WorkerKind::Work => ChangeFeed::Work,
        }
    }

    /// Person and genre feeds only see works the work feed already passed.
    pub fn is_dependent(&self) -> bool {
        !matches!(self, WorkerKind::Work)
    }
}

/// Changed work ids from one page of a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerPage {
    /// De-duplicated, in first-seen order.
    pub work_ids: Vec<Uuid>,
    pub rows: usize,
    /// Watermark to store once the page's works are indexed.
    pub high_watermark: DateTime<Utc>,
}

/// Follows one change feed through an iteration, a page at a time.
///
/// The worker never writes its watermark itself: each page reports the value
/// the watermark may move to once that page has been indexed.
#[derive(Debug)]
pub struct EntitySyncWorker {
    kind: WorkerKind,
    page_size: usize,
    since: DateTime<Utc>,
    work_upper_bound: DateTime<Utc>,
    cursor: Option<PageCursor>,
    rows_seen: usize,
    drained: bool,
}

impl EntitySyncWorker {
    pub fn new(kind: WorkerKind, page_size: usize) -> Self {
        Self {
            kind,
            page_size: page_size.max(1),
            since: min_watermark(),
            work_upper_bound: min_watermark(),
            cursor: None,
            rows_seen: 0,
            drained: true,
        }
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    /// Begin a new iteration.
    ///
    /// `work_watermark` is the work watermark as it stood when the iteration
    /// began; dependent feeds use it as their upper bound for the whole pass.
    pub fn start(&mut self, state: &PipelineState, work_watermark: DateTime<Utc>) {
        self.since = state.watermark(self.kind.key());
        self.work_upper_bound = work_watermark;
        self.cursor = None;
        self.rows_seen = 0;
        self.drained = false;
    }

    /// Fetch the next page of changed work ids.
    ///
    /// Returns `None` once the feed is drained. A dependent feed that matched
    /// nothing at all this iteration yields one empty page carrying its table's
    /// `max(modified)`, so its window does not grow forever.
    pub async fn next_page(
        &mut self,
        source: &dyn SourceReader,
        retry: &RetryPolicy,
    ) -> Result<Option<WorkerPage>, SyncError> {
        if self.drained {
            return Ok(None);
        }

        let query = ChangeQuery {
            feed: self.kind.feed(),
            since: self.since,
            work_upper_bound: self.work_upper_bound,
            after: self.cursor,
            limit: self.page_size,
        };

        let rows = retry_with_backoff(
            retry,
            "fetch_changes",
            || source.fetch_changes(&query),
            SourceError::is_transient,
        )
        .await?;

        if rows.len() < self.page_size {
            self.drained = true;
        }

        let Some(last) = rows.last().copied() else {
            self.drained = true;
            return self.no_data_fallback(source, retry).await;
        };

        self.cursor = Some(last.cursor());
        self.rows_seen += rows.len();

        let mut seen = HashSet::with_capacity(rows.len());
        let work_ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.work_id)
            .filter(|id| seen.insert(*id))
            .collect();

        debug!(
            worker = ?self.kind,
            rows = rows.len(),
            works = work_ids.len(),
            high_watermark = %last.modified,
            "Fetched change page"
        );

        Ok(Some(WorkerPage {
            work_ids,
            rows: rows.len(),
            high_watermark: last.modified,
        }))
    }

    async fn no_data_fallback(
        &self,
        source: &dyn SourceReader,
        retry: &RetryPolicy,
    ) -> Result<Option<WorkerPage>, SyncError> {
        if self.rows_seen > 0 || !self.kind.is_dependent() {
            return Ok(None);
        }

        let table = self.kind.feed().table();
        let max = retry_with_backoff(
            retry,
            "max_modified",
            || source.max_modified(table),
            SourceError::is_transient,
        )
        .await?;

        match max {
            Some(max) if max > self.since => {
                info!(
                    worker = ?self.kind,
                    table = table.as_str(),
                    from = %self.since,
                    to = %max,
                    "No matching changes, moving watermark to table max(modified)"
                );
                Ok(Some(WorkerPage {
                    work_ids: Vec::new(),
                    rows: 0,
                    high_watermark: max,
                }))
            }
            _ => Ok(None),
        }
    }
}
