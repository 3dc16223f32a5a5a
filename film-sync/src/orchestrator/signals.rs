//! Termination signal handling.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Forward the first SIGINT, SIGTERM or SIGHUP to `shutdown_tx`.
///
/// The orchestrator only looks at the request between iterations, so an
/// in-flight load always finishes and its watermarks are saved first.
pub fn spawn_signal_listener(shutdown_tx: broadcast::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                info!(signal = signal, "Received shutdown signal");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!(error = %e, "Failed to install signal handlers"),
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            "SIGINT"
        }
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    })
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
