//! Hydrates batches of changed work ids into full film works.

use std::sync::Arc;

use film_sync_repository::{SourceError, SourceReader};
use film_sync_shared::EnrichedWork;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::SyncError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Runs the enrichment query for one batch of work ids at a time.
pub struct Enricher {
    source: Arc<dyn SourceReader>,
    retry: RetryPolicy,
}

impl Enricher {
    pub fn new(source: Arc<dyn SourceReader>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// One query per batch. Works deleted since their change was detected are
    /// missing from the result.
    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    pub async fn enrich(&self, ids: &[Uuid]) -> Result<Vec<EnrichedWork>, SyncError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let works = retry_with_backoff(
            &self.retry,
            "enrich_works",
            || self.source.enrich_works(ids),
            SourceError::is_transient,
        )
        .await?;

        if works.len() < ids.len() {
            debug!(
                requested = ids.len(),
                found = works.len(),
                "Some changed works no longer exist"
            );
        }

        Ok(works)
    }
}
