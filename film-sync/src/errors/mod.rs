//! Error types for the film sync.

use film_sync_repository::{SearchIndexError, SourceError, StateStoreError};
use thiserror::Error;

/// Errors that can occur while checking or running a sync iteration.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error from the relational source.
    #[error("Source error: {0}")]
    SourceError(SourceError),

    /// Error from the search index.
    #[error("Index error: {0}")]
    IndexError(#[from] SearchIndexError),

    /// Error loading or saving the watermark state.
    #[error("State error: {0}")]
    StateError(#[from] StateStoreError),

    /// A startup check failed; the process cannot run.
    #[error("Pre-check failed: {0}")]
    PreCheckError(String),

    /// A source row did not have the shape the index schema needs.
    #[error("Data shape error: {0}")]
    DataShapeError(String),

    /// The bulk endpoint accepted the request but rejected some documents.
    #[error("Bulk load rejected {failed} of {total} documents: {first_error}")]
    PartialBulkFailure {
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl SyncError {
    /// Create a pre-check error.
    pub fn pre_check(msg: impl Into<String>) -> Self {
        Self::PreCheckError(msg.into())
    }

    /// Create a data shape error.
    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self::DataShapeError(msg.into())
    }
}

impl From<SourceError> for SyncError {
    /// Undecodable rows surface as data shape errors, everything else as source errors.
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Decode(msg) => Self::data_shape(msg),
            other => Self::SourceError(other),
        }
    }
}
