//! # Film Sync
//!
//! Keeps the film catalog search indexes in step with the Postgres catalog,
//! incrementally and resumably, without full re-scans.
//!
//! ## Architecture
//!
//! Each pipeline follows the Extractor-Transformer-Loader pattern:
//!
//! 1. **Extractor**: Detects changed rows from watermarks and pages them out
//! 2. **Transformer**: Maps source rows into search documents
//! 3. **Loader**: Bulk-writes documents into OpenSearch
//! 4. **Orchestrator**: Runs the pipelines in a loop and persists watermarks
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`extractor`]: Change feeds, paging and enrichment hand-off
//! - [`enricher`]: Hydrates work ids into full film works
//! - [`transformer`]: Document mapping
//! - [`loader`]: Bulk indexing with retries
//! - [`pipeline`]: Stage composition
//! - [`orchestrator`]: Sync loop, state machine and signals
//! - [`state`]: In-memory watermarks
//! - [`retry`]: Exponential backoff helper
//! - [`errors`]: Error types for the sync

pub mod config;
pub mod enricher;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod pipeline;
pub mod retry;
pub mod state;
pub mod transformer;

pub use config::{Dependencies, Settings};
pub use errors::SyncError;

use thiserror::Error;

/// Errors that end the process.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
