//! Document types for the search indexes.
//!
//! Every document is written whole: a sync never partially updates one, and
//! the document id is the source row id so a replayed write overwrites rather
//! than duplicates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::catalog::NamedRef;

/// A document that can be bulk-written to a search index.
pub trait IndexDocument: Serialize + Send + Sync {
    /// Generate the document ID used in the search index.
    fn document_id(&self) -> String;
}

/// Film work as stored in the `movies` index.
///
/// The flattened projection of an [`EnrichedWork`](crate::EnrichedWork): work
/// fields plus per-role person arrays and name-only arrays for full-text search.
/// `imdb_rating` and `description` are never null in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncedDocument {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub imdb_rating: f64,
    #[serde(rename = "type")]
    pub work_type: String,
    /// Genre names.
    pub genre: Vec<String>,
    pub genres: Vec<NamedRef>,
    pub actors: Vec<NamedRef>,
    pub writers: Vec<NamedRef>,
    pub directors: Vec<NamedRef>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors_names: Vec<String>,
}

impl IndexDocument for SyncedDocument {
    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Person as stored in the flat `persons` index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonDocument {
    pub id: Uuid,
    pub full_name: String,
}

impl IndexDocument for PersonDocument {
    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Genre as stored in the flat `genres` index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenreDocument {
    pub id: Uuid,
    pub name: String,
}

impl IndexDocument for GenreDocument {
    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
