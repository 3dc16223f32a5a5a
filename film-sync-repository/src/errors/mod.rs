//! Error types for the film sync repository.
//!
//! One error type per backend: the relational source, the search index and the
//! watermark state store.

mod search_index_error;
mod source_error;
mod state_store_error;

pub use search_index_error::SearchIndexError;
pub use source_error::SourceError;
pub use state_store_error::StateStoreError;
