//! Relational source trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use film_sync_shared::{DirectoryRecord, EnrichedWork};
use uuid::Uuid;

use crate::errors::SourceError;
use crate::types::{ChangeQuery, ChangeRow, DirectoryQuery, SourceTable};

/// Read-only access to the film catalog.
///
/// Every method is a single bounded query, so callers can retry any of them
/// independently.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Check that the source is reachable.
    async fn ping(&self) -> Result<(), SourceError>;

    /// Fetch one page of a change feed, ordered by `(modified, entity_id, work_id)`.
    ///
    /// Returns at most `query.limit` rows; fewer means the feed is drained.
    async fn fetch_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeRow>, SourceError>;

    /// Latest `modified` over a whole table, `None` when the table is empty.
    async fn max_modified(&self, table: SourceTable) -> Result<Option<DateTime<Utc>>, SourceError>;

    /// Hydrate film works with their persons and genres.
    ///
    /// Returns one value per id that still exists; ids of deleted works are
    /// silently dropped.
    async fn enrich_works(&self, ids: &[Uuid]) -> Result<Vec<EnrichedWork>, SourceError>;

    /// Fetch one page of a flat person or genre table, ordered by `(modified, id)`.
    async fn fetch_directory(
        &self,
        query: &DirectoryQuery,
    ) -> Result<Vec<DirectoryRecord>, SourceError>;
}
