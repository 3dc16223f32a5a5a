//! This module defines the core data structures used across the film sync.
//! It re-exports the source records, index documents and watermark keys.

pub mod catalog;
pub mod documents;
pub mod watermark;

pub use catalog::{DirectoryRecord, EnrichedWork, NamedRef, PersonRole, PersonWithRole};
pub use documents::{GenreDocument, IndexDocument, PersonDocument, SyncedDocument};
pub use watermark::{min_watermark, WatermarkKey};
