//! Records read from the relational catalog.
//!
//! The catalog itself is owned by an external system; these types only describe
//! what the sync reads back from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a person plays in a film work.
///
/// Deserialization is strict: a role outside this set is a data-shape error
/// rather than something to silently drop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Actor,
    Writer,
    Director,
}

/// An `{id, name}` pair, used for genres and for persons once their role is known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A person attached to a film work through one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonWithRole {
    pub role: PersonRole,
    pub id: Uuid,
    pub name: String,
}

impl PersonWithRole {
    pub fn new(role: PersonRole, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            role,
            id,
            name: name.into(),
        }
    }
}

/// A film work hydrated with its related persons and genres.
///
/// Produced by the enrichment query: one value per work id that still exists
/// in the source. `persons` and `genres` are empty, never absent, when the work
/// has no related rows.
///
/// # Fields
///
/// - `id`: Work identifier, reused as the search document id
/// - `title`: Work title
/// - `description`: Optional description (nullable in the source)
/// - `rating`: Optional rating (nullable in the source)
/// - `work_type`: Work type (e.g. `movie`, `tv_show`)
/// - `modified`: Change-detection timestamp, never written to the index
/// - `persons`: Related persons, each tagged with a role
/// - `genres`: Related genres
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedWork {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub work_type: String,
    pub modified: DateTime<Utc>,
    pub persons: Vec<PersonWithRole>,
    pub genres: Vec<NamedRef>,
}

/// A flat person or genre row, as read by the directory sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub id: Uuid,
    pub name: String,
    pub modified: DateTime<Utc>,
}
