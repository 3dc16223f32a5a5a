//! Transform stage: pure mapping from source records to index documents.

mod directory;
mod document_mapper;

pub use directory::{GenreDocumentMapper, PersonDocumentMapper};
pub use document_mapper::DocumentMapper;

/// Maps one extracted item to one index document. No I/O, no side effects.
pub trait Transformer: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn transform(&self, input: Self::Input) -> Self::Output;

    fn transform_batch(&self, inputs: Vec<Self::Input>) -> Vec<Self::Output> {
        inputs.into_iter().map(|input| self.transform(input)).collect()
    }
}
