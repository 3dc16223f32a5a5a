//! Dependency initialization and wiring for the film sync.

use std::sync::Arc;

use film_sync_repository::opensearch::IndexKind;
use film_sync_repository::{
    JsonFileWatermarkStore, OpenSearchProvider, PostgresSourceReader, SearchIndexProvider,
    SourceReader,
};
use tracing::info;

use super::Settings;
use crate::extractor::{DirectoryExtractor, FilmWorkExtractor};
use crate::loader::{Indexer, IndexerConfig};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::pipeline::{Pipeline, SyncPipeline};
use crate::transformer::{DocumentMapper, GenreDocumentMapper, PersonDocumentMapper};
use crate::ServiceError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Build the Postgres reader, OpenSearch provider, state store and pipelines.
    ///
    /// Nothing here touches the network: the database pool connects lazily and
    /// reachability is verified by the orchestrator's pre-check.
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            opensearch_url = %settings.search.url,
            movies_index = %settings.search.movies_index,
            directory_indexes = settings.sync.directory_indexes,
            create_missing_indexes = settings.search.create_missing_indexes,
            state_file = %settings.sync.state_file.display(),
            "Initializing dependencies"
        );

        let source = PostgresSourceReader::connect_lazy(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.acquire_timeout,
        )
        .map_err(|e| ServiceError::config(format!("Failed to create Postgres pool: {}", e)))?;

        let search = OpenSearchProvider::new(&settings.search.url, settings.search.timeout)
            .map_err(|e| {
                ServiceError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        let store = JsonFileWatermarkStore::new(&settings.sync.state_file);

        let pipelines = build_pipelines(settings, Arc::new(source), Arc::new(search));

        let orchestrator = Orchestrator::new(
            pipelines,
            Arc::new(store),
            OrchestratorConfig {
                sync_interval: settings.sync.interval,
                max_iterations: settings.sync.max_iterations,
            },
        );

        Ok(Self { orchestrator })
    }
}

/// Assemble the pipelines in execution order: film works first, then the
/// optional person and genre directories.
pub fn build_pipelines(
    settings: &Settings,
    source: Arc<dyn SourceReader>,
    search: Arc<dyn SearchIndexProvider>,
) -> Vec<Box<dyn Pipeline>> {
    let page_size = settings.sync.extract_batch_size;
    let retry = settings.retry.clone();
    let indexer = |index: &str, kind: IndexKind| {
        let mut config = IndexerConfig::new(index, kind);
        config.batch_size = settings.sync.index_batch_size;
        config.create_missing = settings.search.create_missing_indexes;
        Indexer::new(Arc::clone(&search), config, retry.clone())
    };

    let mut pipelines: Vec<Box<dyn Pipeline>> = vec![Box::new(SyncPipeline::new(
        "movies",
        FilmWorkExtractor::new(Arc::clone(&source), page_size, retry.clone()),
        DocumentMapper::new(),
        indexer(&settings.search.movies_index, IndexKind::Movies),
    ))];

    if settings.sync.directory_indexes {
        pipelines.push(Box::new(SyncPipeline::new(
            "persons",
            DirectoryExtractor::persons(Arc::clone(&source), page_size, retry.clone()),
            PersonDocumentMapper,
            indexer(&settings.search.persons_index, IndexKind::Persons),
        )));
        pipelines.push(Box::new(SyncPipeline::new(
            "genres",
            DirectoryExtractor::genres(Arc::clone(&source), page_size, retry.clone()),
            GenreDocumentMapper,
            indexer(&settings.search.genres_index, IndexKind::Genres),
        )));
    }

    pipelines
}
