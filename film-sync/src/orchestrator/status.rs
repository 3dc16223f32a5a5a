//! Orchestrator state machine, published on a watch channel.

use std::fmt;

use tokio::sync::watch;
use tracing::debug;

/// Step of a running iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Extracting,
    Enriching,
    Loading,
    Persisting,
}

/// Lifecycle of the orchestrator.
///
/// `Idle -> PreChecking -> Running -> Sleeping -> Running -> ... -> Stopped`.
/// A failed pre-check goes straight to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    PreChecking,
    Running(RunPhase),
    Sleeping,
    Stopped,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorState::Idle => write!(f, "idle"),
            OrchestratorState::PreChecking => write!(f, "pre-checking"),
            OrchestratorState::Running(phase) => {
                write!(f, "running:{}", format!("{:?}", phase).to_lowercase())
            }
            OrchestratorState::Sleeping => write!(f, "sleeping"),
            OrchestratorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Write side of the state channel, handed to pipelines so they can report
/// which phase an iteration is in.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: watch::Sender<OrchestratorState>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OrchestratorState::Idle);
        Self { tx }
    }

    pub fn set(&self, state: OrchestratorState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            debug!(state = %state, "Orchestrator state changed");
        }
    }

    pub fn phase(&self, phase: RunPhase) {
        self.set(OrchestratorState::Running(phase));
    }

    pub fn current(&self) -> OrchestratorState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.tx.subscribe()
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_published() {
        let status = StatusReporter::new();
        let rx = status.subscribe();

        status.set(OrchestratorState::PreChecking);
        status.phase(RunPhase::Loading);

        assert_eq!(*rx.borrow(), OrchestratorState::Running(RunPhase::Loading));
        assert_eq!(status.current().to_string(), "running:loading");
    }

    #[test]
    fn test_state_survives_without_subscribers() {
        let status = StatusReporter::new();

        status.set(OrchestratorState::Sleeping);

        assert_eq!(status.current(), OrchestratorState::Sleeping);
    }
}
