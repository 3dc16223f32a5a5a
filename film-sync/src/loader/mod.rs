//! Loader module for the film sync.
//!
//! Writes mapped documents into the search index with bulk requests.

use std::sync::Arc;

use async_trait::async_trait;
use film_sync_repository::opensearch::{get_index_settings, IndexKind};
use film_sync_repository::{BulkDocument, SearchIndexError, SearchIndexProvider};
use film_sync_shared::IndexDocument;
use tracing::{debug, error, info, instrument};

use crate::errors::SyncError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Sink side of a pipeline.
#[async_trait]
pub trait Loader<D>: Send + Sync {
    /// Verify the target is reachable and ready. Run once, before the loop.
    async fn pre_check(&self) -> Result<(), SyncError>;

    /// Write `documents`, returning how many the target accepted.
    ///
    /// Succeeds only if every document was written.
    async fn load(&self, documents: Vec<D>) -> Result<usize, SyncError>;
}

/// Configuration for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Target index name.
    pub index: String,
    /// Which mappings to create the index with.
    pub kind: IndexKind,
    /// Documents per bulk request.
    pub batch_size: usize,
    /// Create the index during the pre-check instead of failing when it is missing.
    pub create_missing: bool,
}

impl IndexerConfig {
    pub fn new(index: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            index: index.into(),
            kind,
            batch_size: 1000,
            create_missing: false,
        }
    }
}

/// Loader that bulk-writes documents into one search index.
///
/// Every document is written with replace semantics under its own id, so a
/// replayed batch overwrites instead of duplicating.
pub struct Indexer {
    provider: Arc<dyn SearchIndexProvider>,
    config: IndexerConfig,
    retry: RetryPolicy,
}

impl Indexer {
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        config: IndexerConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            config,
            retry,
        }
    }

    pub fn index(&self) -> &str {
        &self.config.index
    }

    fn to_bulk<D: IndexDocument>(documents: &[D]) -> Result<Vec<BulkDocument>, SyncError> {
        documents
            .iter()
            .map(|doc| {
                let source = serde_json::to_value(doc).map_err(|e| {
                    SearchIndexError::serialization(format!(
                        "Failed to serialize document {}: {}",
                        doc.document_id(),
                        e
                    ))
                })?;
                Ok(BulkDocument {
                    id: doc.document_id(),
                    source,
                })
            })
            .collect()
    }

    /// Send one chunk, retrying transient failures of the whole request.
    async fn flush_chunk(&self, chunk: &[BulkDocument]) -> Result<usize, SyncError> {
        let index = self.config.index.as_str();
        let summary = retry_with_backoff(
            &self.retry,
            "bulk_upsert",
            || self.provider.bulk_upsert(index, chunk),
            SearchIndexError::is_transient,
        )
        .await
        .map_err(|e| {
            error!(index = %index, count = chunk.len(), error = %e, "Failed to bulk index documents");
            e
        })?;

        if summary.failed > 0 {
            for result in summary.results.iter().filter(|r| !r.success) {
                if let Some(ref err) = result.error {
                    error!(
                        index = %index,
                        document_id = %result.document_id,
                        error = %err,
                        "Failed to index document"
                    );
                }
            }
            let first_error = summary
                .results
                .iter()
                .find_map(|r| r.error.as_ref().map(ToString::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(SyncError::PartialBulkFailure {
                failed: summary.failed,
                total: summary.total,
                first_error,
            });
        }

        debug!(index = %index, count = summary.succeeded, "Indexed chunk");
        Ok(summary.succeeded)
    }
}

#[async_trait]
impl<D> Loader<D> for Indexer
where
    D: IndexDocument + 'static,
{
    #[instrument(skip(self), fields(index = %self.config.index))]
    async fn pre_check(&self) -> Result<(), SyncError> {
        let index = self.config.index.as_str();

        self.provider
            .ping()
            .await
            .map_err(|e| SyncError::pre_check(format!("Search index is unreachable: {}", e)))?;

        if self.config.create_missing {
            let settings = get_index_settings(self.config.kind);
            self.provider
                .ensure_index_exists(index, &settings)
                .await
                .map_err(|e| {
                    SyncError::pre_check(format!("Failed to ensure index {} exists: {}", index, e))
                })?;
        } else {
            let exists = self.provider.index_exists(index).await.map_err(|e| {
                SyncError::pre_check(format!("Failed to check index {}: {}", index, e))
            })?;
            if !exists {
                return Err(SyncError::pre_check(format!(
                    "Index {} does not exist",
                    index
                )));
            }
        }

        info!(index = %index, "Index is ready");
        Ok(())
    }

    #[instrument(skip(self, documents), fields(index = %self.config.index, document_count = documents.len()))]
    async fn load(&self, documents: Vec<D>) -> Result<usize, SyncError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let bulk = Self::to_bulk(&documents)?;
        let mut loaded = 0;
        for chunk in bulk.chunks(self.config.batch_size.max(1)) {
            loaded += self.flush_chunk(chunk).await?;
        }

        Ok(loaded)
    }
}
