//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationSummary, BulkDocument};

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the sync's loader to enable dependency
/// injection and easy testing with mock implementations.
///
/// # Note on Document Writes
///
/// There is no partial update: every write replaces the whole document under
/// its id, so replaying the same batch is idempotent.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check that the backend is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the backend answered
    /// * `Err(SearchIndexError)` - If the backend is unreachable or unhealthy
    async fn ping(&self) -> Result<(), SearchIndexError>;

    /// Check whether `index` exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Ensure `index` exists, creating it with `settings` (settings and mappings) if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If creation fails
    async fn ensure_index_exists(&self, index: &str, settings: &Value)
        -> Result<(), SearchIndexError>;

    /// Write documents in one bulk request, replacing any document with the same id.
    ///
    /// # Arguments
    ///
    /// * `index` - Target index name
    /// * `documents` - Documents to write, each keyed by its id
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_upsert(
        &self,
        index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
