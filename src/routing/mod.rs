//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HttpServer::handle(path, handler)
//!     → registry.rs (validate, append)
//!
//! Server start:
//!     RouteRegistry
//!     → wrap each handler (CORS)
//!     → Freeze as immutable axum Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact path matching, no prefixes or patterns beyond what axum offers
//! - Conflicts surface at registration time

pub mod registry;

pub use registry::{RegistryError, Route, RouteRegistry};
