//! # Film Sync Shared
//!
//! This crate defines shared data structures used across the film catalog sync.
//! It includes the rows read from the relational source, the documents written to
//! the search index, and the watermark keys that make the sync resumable.

pub mod types;

pub use types::catalog::{DirectoryRecord, EnrichedWork, NamedRef, PersonRole, PersonWithRole};
pub use types::documents::{GenreDocument, IndexDocument, PersonDocument, SyncedDocument};
pub use types::watermark::{min_watermark, WatermarkKey};
