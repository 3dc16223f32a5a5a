//! Request and response types for source, index and state operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::SearchIndexError;

/// Persisted watermarks, keyed by state file key (`fw_date`, `p_date`, ...).
pub type Watermarks = BTreeMap<String, DateTime<Utc>>;

/// Catalog tables the sync reads change timestamps from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTable {
    FilmWork,
    Person,
    Genre,
}

impl SourceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTable::FilmWork => "film_work",
            SourceTable::Person => "person",
            SourceTable::Genre => "genre",
        }
    }
}

/// Change feeds that produce film work ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFeed {
    /// Works modified since the work watermark.
    Work,
    /// Works whose persons changed after the work itself was last modified.
    Person,
    /// Works whose genres changed after the work itself was last modified.
    Genre,
}

impl ChangeFeed {
    /// The table whose `modified` column drives this feed.
    pub fn table(&self) -> SourceTable {
        match self {
            ChangeFeed::Work => SourceTable::FilmWork,
            ChangeFeed::Person => SourceTable::Person,
            ChangeFeed::Genre => SourceTable::Genre,
        }
    }
}

/// Position after the last row of a page, used for keyset pagination.
///
/// Rows are ordered by `(modified, entity_id, work_id)`. For feeds keyed by a
/// single id `work_id` equals `entity_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub modified: DateTime<Utc>,
    pub entity_id: Uuid,
    pub work_id: Uuid,
}

impl PageCursor {
    /// Cursor for a feed keyed by a single id.
    pub fn for_entity(modified: DateTime<Utc>, id: Uuid) -> Self {
        Self {
            modified,
            entity_id: id,
            work_id: id,
        }
    }
}

/// One page request against a change feed.
#[derive(Debug, Clone)]
pub struct ChangeQuery {
    pub feed: ChangeFeed,
    /// Lower bound (inclusive) on the feed's own `modified`.
    pub since: DateTime<Utc>,
    /// Upper bound (exclusive) on `film_work.modified` for the person and genre
    /// feeds. Ignored by the work feed.
    pub work_upper_bound: DateTime<Utc>,
    /// Continue strictly after this position.
    pub after: Option<PageCursor>,
    pub limit: usize,
}

/// A changed film work as reported by a change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRow {
    pub work_id: Uuid,
    /// Id of the row that changed: the work itself, a person or a genre.
    pub entity_id: Uuid,
    /// `modified` of the row that changed.
    pub modified: DateTime<Utc>,
}

impl ChangeRow {
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            modified: self.modified,
            entity_id: self.entity_id,
            work_id: self.work_id,
        }
    }
}

/// One page request against a flat person or genre table.
#[derive(Debug, Clone)]
pub struct DirectoryQuery {
    pub table: SourceTable,
    pub since: DateTime<Utc>,
    pub after: Option<PageCursor>,
    pub limit: usize,
}

/// A whole document to write with replace semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDocument {
    pub id: String,
    pub source: Value,
}

/// Result of a batch operation for a single item.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's identifier.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// The bulk endpoint can accept a request and still reject some of its items, so
/// callers must check `failed` even when the call itself returned `Ok`.
#[derive(Debug, Clone)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}
