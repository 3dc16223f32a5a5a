//! Interface definitions for the sync's external collaborators.
//!
//! This module defines the abstract traits that allow for dependency injection
//! and swappable backends: the relational source, the search index and the
//! watermark state store.

mod search_index_provider;
mod source_reader;
mod watermark_store;

pub use search_index_provider::SearchIndexProvider;
pub use source_reader::SourceReader;
pub use watermark_store::WatermarkStore;
