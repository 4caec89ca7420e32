//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1.1, timeouts, request ID, tracing)
//!     → registered route (exact path)
//!         → middleware/cors.rs (preflight, CORS headers)
//!         → proxy.rs (bearer check, forward upstream)
//!         → auth.rs (sign-in placeholder)
//!     → /static/* (ServeDir)
//!     → Send to client
//! ```

pub mod auth;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod server;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use server::{GatewayState, HttpServer, ServerError};
