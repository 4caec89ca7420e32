//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before the listener task is spawned, so a signal
//!   arriving right after startup is never lost

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Register SIGINT/SIGTERM handlers and trigger `shutdown` on the first one.
pub fn listen_for_signals(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    let mut signals = Signals::register()?;

    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        tracing::info!(signal = name, "Shutdown signal received");
        shutdown.trigger();
    }))
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}
