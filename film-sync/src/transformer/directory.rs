//! Person and genre rows to flat directory documents.

use film_sync_shared::{DirectoryRecord, GenreDocument, PersonDocument};

use super::Transformer;

#[derive(Debug, Clone, Copy, Default)]
pub struct PersonDocumentMapper;

impl Transformer for PersonDocumentMapper {
    type Input = DirectoryRecord;
    type Output = PersonDocument;

    fn transform(&self, input: DirectoryRecord) -> PersonDocument {
        PersonDocument {
            id: input.id,
            full_name: input.name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenreDocumentMapper;

impl Transformer for GenreDocumentMapper {
    type Input = DirectoryRecord;
    type Output = GenreDocument;

    fn transform(&self, input: DirectoryRecord) -> GenreDocument {
        GenreDocument {
            id: input.id,
            name: input.name,
        }
    }
}
