//! Server lifecycle phases.

use tokio::sync::watch;

/// Where a server is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerPhase {
    /// Built, no routes yet.
    Constructed,
    /// At least one route registered.
    Configured,
    /// Listener bound, accepting connections.
    Running,
    /// No longer accepting, draining in-flight requests.
    ShuttingDown,
    /// All connections closed or aborted.
    Stopped,
}

impl std::fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServerPhase::Constructed => "constructed",
            ServerPhase::Configured => "configured",
            ServerPhase::Running => "running",
            ServerPhase::ShuttingDown => "shutting_down",
            ServerPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Publishes phase transitions; transitions only ever move forward.
#[derive(Debug)]
pub struct PhaseTracker {
    tx: watch::Sender<ServerPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerPhase::Constructed);
        Self { tx }
    }

    pub fn current(&self) -> ServerPhase {
        *self.tx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<ServerPhase> {
        self.tx.subscribe()
    }

    /// Move to `next`. Returns false and leaves the phase alone if `next` is
    /// not strictly later than the current phase.
    pub fn advance(&self, next: ServerPhase) -> bool {
        let moved = self.tx.send_if_modified(|phase| {
            if next > *phase {
                *phase = next;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::debug!(phase = %next, "Server phase changed");
        }
        moved
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
