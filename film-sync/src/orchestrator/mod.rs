//! Orchestrator module for the film sync.
//!
//! Runs the pipelines in a loop: one iteration drains every pipeline in order
//! and then persists the watermarks once. A failed iteration persists nothing
//! and the whole iteration is retried after the sleep interval.

mod signals;
mod status;

pub use signals::spawn_signal_listener;
pub use status::{OrchestratorState, RunPhase, StatusReporter};

use std::sync::Arc;
use std::time::Instant;

use film_sync_repository::WatermarkStore;
use tokio::sync::{broadcast, watch};
use tokio::time::Duration;
use tracing::{error, info, instrument};

use crate::errors::SyncError;
use crate::pipeline::Pipeline;
use crate::state::{IterationStats, PipelineState};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Sleep between iterations.
    pub sync_interval: Duration,
    /// Stop after this many iterations; run until shutdown when `None`.
    pub max_iterations: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(10),
            max_iterations: None,
        }
    }
}

/// Orchestrator that drives the sync loop.
///
/// The orchestrator:
/// - Pre-checks every pipeline once; a failure is fatal
/// - Owns the only `PipelineState`, committing it only after a successful save
/// - Checks for shutdown between iterations and while sleeping, never mid-iteration
/// - Publishes its state on a watch channel
pub struct Orchestrator {
    pipelines: Vec<Box<dyn Pipeline>>,
    store: Arc<dyn WatermarkStore>,
    config: OrchestratorConfig,
    status: StatusReporter,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Orchestrator {
    /// Create a new orchestrator. Pipelines run in the given order.
    pub fn new(
        pipelines: Vec<Box<dyn Pipeline>>,
        store: Arc<dyn WatermarkStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            pipelines,
            store,
            config,
            status: StatusReporter::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Sender that requests a graceful shutdown when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn subscribe_state(&self) -> watch::Receiver<OrchestratorState> {
        self.status.subscribe()
    }

    pub fn state(&self) -> OrchestratorState {
        self.status.current()
    }

    /// Run the orchestrator.
    ///
    /// Returns `Ok` on graceful shutdown or after `max_iterations`, and `Err`
    /// when the pre-check or the initial state load fails.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), SyncError> {
        info!(
            pipelines = self.pipelines.len(),
            sync_interval_secs = self.config.sync_interval.as_secs_f64(),
            "Starting film sync orchestrator"
        );

        self.status.set(OrchestratorState::PreChecking);
        let mut committed = match self.startup().await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Pre-check failed, stopping");
                self.status.set(OrchestratorState::Stopped);
                return Err(e);
            }
        };

        let mut iteration: u64 = 0;
        loop {
            if self.shutdown_requested() {
                info!("Shutdown requested");
                break;
            }

            iteration += 1;
            committed = self.run_once(iteration, committed).await;

            if self
                .config
                .max_iterations
                .is_some_and(|max| iteration >= max)
            {
                info!(iterations = iteration, "Reached iteration limit");
                break;
            }

            self.status.set(OrchestratorState::Sleeping);
            if self.sleep_or_shutdown().await {
                info!("Shutdown requested while sleeping");
                break;
            }
        }

        self.status.set(OrchestratorState::Stopped);
        info!(iterations = iteration, "Orchestrator shutdown complete");
        Ok(())
    }

    async fn startup(&self) -> Result<PipelineState, SyncError> {
        for pipeline in &self.pipelines {
            pipeline.pre_check().await?;
            info!(pipeline = pipeline.name(), "Pre-check passed");
        }

        let watermarks = self.store.load().await?;
        info!(watermarks = ?watermarks, "Loaded watermark state");
        Ok(PipelineState::from_watermarks(watermarks))
    }

    /// Run one iteration against a working copy of `committed`.
    ///
    /// Returns the new committed state: the working copy if the iteration and
    /// the save both succeeded, `committed` unchanged otherwise.
    async fn run_once(&mut self, iteration: u64, committed: PipelineState) -> PipelineState {
        let started = Instant::now();
        let mut working = committed.clone();

        let stats = match self.run_pipelines(&mut working).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    iteration = iteration,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Iteration aborted, watermarks not persisted"
                );
                return committed;
            }
        };

        self.status.phase(RunPhase::Persisting);
        if let Err(e) = self.store.save(working.watermarks()).await {
            error!(
                iteration = iteration,
                error = %e,
                "Failed to persist watermarks, iteration will be repeated"
            );
            return committed;
        }

        info!(
            iteration = iteration,
            rows_extracted = stats.rows_extracted,
            documents_indexed = stats.documents_loaded,
            batches = stats.batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            watermarks = ?working.watermarks(),
            "Iteration complete"
        );
        working
    }

    async fn run_pipelines(
        &mut self,
        state: &mut PipelineState,
    ) -> Result<IterationStats, SyncError> {
        let mut total = IterationStats::default();
        for pipeline in &mut self.pipelines {
            let stats = pipeline.run_iteration(state, &self.status).await?;
            total.merge(stats);
        }
        Ok(total)
    }

    fn shutdown_requested(&mut self) -> bool {
        match self.shutdown_rx.try_recv() {
            Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_)) => true,
            Err(broadcast::error::TryRecvError::Empty) => false,
            Err(broadcast::error::TryRecvError::Closed) => false,
        }
    }

    /// Sleep for the sync interval. Returns `true` if shutdown was requested.
    async fn sleep_or_shutdown(&mut self) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.sync_interval) => false,
            msg = self.shutdown_rx.recv() => !matches!(msg, Err(broadcast::error::RecvError::Closed)),
        }
    }
}
