//! Film Sync Main Entry Point
//!
//! Syncs the film catalog from Postgres into OpenSearch until it receives a
//! termination signal.

use dotenv::dotenv;
use film_sync::config::{LogFormat, LogSettings};
use film_sync::orchestrator::spawn_signal_listener;
use film_sync::{Dependencies, ServiceError, Settings};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing(log: &LogSettings) {
    let default_level = if log.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "film_sync={level},film_sync_repository={level}",
            level = default_level
        ))
    });

    match log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();
        }
    }

    info!(
        service_name = "film-sync",
        service_version = env!("CARGO_PKG_VERSION"),
        format = ?log.format,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // Load environment variables from .env file
    dotenv().ok();

    let settings = Settings::from_env();
    init_tracing(
        &settings
            .as_ref()
            .map(|s| s.log.clone())
            .unwrap_or_default(),
    );

    let settings = settings.map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!("Starting film sync");

    let mut deps = match Dependencies::new(&settings) {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    spawn_signal_listener(deps.orchestrator.shutdown_handle());

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Film sync stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Film sync failed");
            Err(e.into())
        }
    }
}
