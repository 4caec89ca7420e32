//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Forward upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → Return to client
//! ```
//!
//! # Design Decisions
//! - Hop-by-hop headers never cross the gateway
//! - Bearer credentials are checked by prefix only (see http::proxy)

pub mod headers;
