//! # Film Sync Repository
//!
//! This crate provides traits and implementations for everything the film sync
//! reads from or writes to: the relational catalog, the search index and the
//! watermark state file. It includes definitions for errors, interfaces, and
//! concrete implementations for Postgres, OpenSearch and a JSON file.

pub mod errors;
pub mod file;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use errors::{SearchIndexError, SourceError, StateStoreError};
pub use file::JsonFileWatermarkStore;
pub use interfaces::{SearchIndexProvider, SourceReader, WatermarkStore};
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresSourceReader;
pub use types::{
    BatchOperationResult, BatchOperationSummary, BulkDocument, ChangeFeed, ChangeQuery, ChangeRow,
    DirectoryQuery, PageCursor, SourceTable, Watermarks,
};
