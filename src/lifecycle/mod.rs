//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → HttpServer::new → register routes → start (bind, serve)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Abort after grace period
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Phases (phase.rs):
//!     Constructed → Configured → Running → ShuttingDown → Stopped
//! ```
//!
//! # Design Decisions
//! - Shutdown is an explicit token passed into the serve loop, not a global
//! - Shutdown has timeout: forced close after deadline

pub mod phase;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use phase::ServerPhase;
pub use shutdown::{Shutdown, ShutdownSignal};
