//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from a validated configuration
//! - Register the gateway routes before anything binds
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Routes are registered before the listener exists, so no handler can
//!   run before the socket is bound

use crate::config::GatewayConfig;
use crate::http::auth::signin_handler;
use crate::http::proxy::graphql_proxy_handler;
use crate::http::server::{HttpServer, ServerError};

/// Path proxied to the upstream GraphQL endpoint.
pub const GRAPHQL_PATH: &str = "/api/graphql";

/// Sign-in placeholder path.
pub const SIGNIN_PATH: &str = "/api/auth/signin";

/// Build a server with the GraphQL proxy and sign-in routes registered.
pub fn build_gateway(config: GatewayConfig) -> Result<HttpServer, ServerError> {
    let mut server = HttpServer::new(config)?;
    server.handle(GRAPHQL_PATH, graphql_proxy_handler)?;
    server.handle(SIGNIN_PATH, signin_handler)?;
    Ok(server)
}
