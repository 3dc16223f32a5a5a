//! Composes one extractor, transformer and loader into a runnable pipeline.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::SyncError;
use crate::extractor::Extractor;
use crate::loader::Loader;
use crate::orchestrator::{RunPhase, StatusReporter};
use crate::state::{IterationStats, PipelineState};
use crate::transformer::Transformer;

/// A pipeline as seen by the orchestrator.
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;

    /// Startup check of the pipeline's source and sink.
    async fn pre_check(&self) -> Result<(), SyncError>;

    /// Drain the pipeline once, advancing `state` batch by batch.
    ///
    /// A batch's watermark moves only after its documents were loaded. On error
    /// `state` may hold advances from earlier batches; the caller discards it.
    async fn run_iteration(
        &mut self,
        state: &mut PipelineState,
        status: &StatusReporter,
    ) -> Result<IterationStats, SyncError>;
}

pub struct SyncPipeline<E, T, L> {
    name: String,
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> SyncPipeline<E, T, L> {
    pub fn new(name: impl Into<String>, extractor: E, transformer: T, loader: L) -> Self {
        Self {
            name: name.into(),
            extractor,
            transformer,
            loader,
        }
    }
}

#[async_trait]
impl<E, T, L> Pipeline for SyncPipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<T::Output>,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_check(&self) -> Result<(), SyncError> {
        self.extractor.pre_check().await?;
        self.loader.pre_check().await
    }

    #[instrument(skip_all, fields(pipeline = %self.name))]
    async fn run_iteration(
        &mut self,
        state: &mut PipelineState,
        status: &StatusReporter,
    ) -> Result<IterationStats, SyncError> {
        let mut stats = IterationStats::default();
        self.extractor.start(state);

        while let Some(batch) = self.extractor.next_batch(status).await? {
            stats.rows_extracted += batch.rows;

            let documents = self.transformer.transform_batch(batch.items);
            if !documents.is_empty() {
                status.phase(RunPhase::Loading);
                stats.documents_loaded += self.loader.load(documents).await?;
            }

            state.advance(batch.key, batch.high_watermark);
            stats.batches += 1;
        }

        debug!(
            rows_extracted = stats.rows_extracted,
            documents_loaded = stats.documents_loaded,
            batches = stats.batches,
            "Pipeline drained"
        );
        Ok(stats)
    }
}
