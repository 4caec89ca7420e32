//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (connection ID, idle timeout wrapper)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection carries an ID for log correlation

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, IdleTimeout};
pub use listener::{ConnectionPermit, Listener, ListenerError};
