//! Film work to `movies` document mapping.

use film_sync_shared::{EnrichedWork, NamedRef, PersonRole, SyncedDocument};

use super::Transformer;

/// Rating written when the source has none; the index field is non-null.
const DEFAULT_RATING: f64 = 0.0;

/// Flattens an [`EnrichedWork`] into a [`SyncedDocument`].
///
/// Persons are split into one array per role plus a name-only array per role.
/// Source order is kept within each array.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMapper;

impl DocumentMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map(&self, work: EnrichedWork) -> SyncedDocument {
        let mut actors = Vec::new();
        let mut writers = Vec::new();
        let mut directors = Vec::new();

        for person in work.persons {
            let named = NamedRef::new(person.id, person.name);
            match person.role {
                PersonRole::Actor => actors.push(named),
                PersonRole::Writer => writers.push(named),
                PersonRole::Director => directors.push(named),
            }
        }

        SyncedDocument {
            id: work.id,
            title: work.title,
            description: work.description.unwrap_or_default(),
            imdb_rating: work.rating.unwrap_or(DEFAULT_RATING),
            work_type: work.work_type,
            genre: names(&work.genres),
            genres: work.genres,
            actors_names: names(&actors),
            writers_names: names(&writers),
            directors_names: names(&directors),
            actors,
            writers,
            directors,
        }
    }
}

fn names(refs: &[NamedRef]) -> Vec<String> {
    refs.iter().map(|r| r.name.clone()).collect()
}

impl Transformer for DocumentMapper {
    type Input = EnrichedWork;
    type Output = SyncedDocument;

    fn transform(&self, input: EnrichedWork) -> SyncedDocument {
        self.map(input)
    }
}
