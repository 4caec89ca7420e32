//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Hold configuration, registered routes and shared handler state
//! - Freeze routes into an Axum Router (CORS and handler timeout per route, static files)
//! - Wire up middleware (tracing, request ID, timeouts)
//! - Accept connections and serve them with hyper
//! - Drain connections on shutdown within the grace period

use axum::{
    body::Body,
    extract::ConnectInfo,
    handler::Handler,
    http::Request,
    middleware,
    routing::any,
    Router,
};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::validation::parse_upstream_url;
use crate::config::GatewayConfig;
use crate::http::middleware::cors_middleware;
use crate::http::request::{request_id_of, RequestIdGenerator, X_REQUEST_ID};
use crate::lifecycle::phase::{PhaseTracker, ServerPhase};
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::lifecycle::signals::listen_for_signals;
use crate::net::{ConnectionGuard, ConnectionPermit, IdleTimeout, Listener, ListenerError};
use crate::routing::{RegistryError, RouteRegistry};

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Errors that stop the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid upstream URL: {0}")]
    Upstream(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: ListenerError,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub client: reqwest::Client,
    pub upstream: Arc<Url>,
    /// Largest request body buffered for forwarding.
    pub max_body_size: usize,
}

impl GatewayState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        let upstream =
            parse_upstream_url(&config.upstream.graphql_url).map_err(ServerError::Upstream)?;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            upstream: Arc::new(upstream),
            max_body_size: config.security.max_body_size,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    read_header: Duration,
    idle: Duration,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    config: GatewayConfig,
    routes: RouteRegistry<GatewayState>,
    state: GatewayState,
    phase: PhaseTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let state = GatewayState::from_config(&config)?;

        let mut routes = RouteRegistry::new();
        routes.reserve_prefix(config.static_files.prefix.clone());

        Ok(Self {
            config,
            routes,
            state,
            phase: PhaseTracker::new(),
        })
    }

    /// Register `handler` for every method on `path`.
    ///
    /// The handler is wrapped in CORS middleware when the server starts.
    pub fn handle<H, T>(&mut self, path: &str, handler: H) -> Result<(), RegistryError>
    where
        H: Handler<T, GatewayState>,
        T: 'static,
    {
        self.routes.register(path, any(handler))?;
        self.phase.advance(ServerPhase::Configured);
        Ok(())
    }

    /// Observe lifecycle transitions.
    pub fn phase(&self) -> watch::Receiver<ServerPhase> {
        self.phase.watch()
    }

    /// Build the dispatch table from the registered routes.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let timeouts = &self.config.timeouts;
        let statics = &self.config.static_files;

        // The handler timeout sits inside CORS so a 408 still carries the headers.
        self.routes
            .freeze(|handler| {
                handler
                    .layer(TimeoutLayer::new(timeouts.write()))
                    .layer(middleware::from_fn(cors_middleware))
            })
            .nest_service(&statics.prefix, ServeDir::new(&statics.dir))
            .with_state(self.state.clone())
            .layer(ResponseBodyTimeoutLayer::new(timeouts.write()))
            .layer(RequestBodyTimeoutLayer::new(timeouts.read()))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id_of(request.headers()),
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), RequestIdGenerator))
    }

    /// Bind the configured address, listen for SIGINT/SIGTERM and serve
    /// until one arrives.
    pub async fn start(self) -> Result<(), ServerError> {
        let listener = Listener::bind(&self.config.listener)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.config.listener.bind_address.clone(),
                source,
            })?;

        let shutdown = Shutdown::new();
        let signals = listen_for_signals(shutdown.clone()).map_err(ServerError::Signals)?;

        let result = self.serve(listener, shutdown.subscribe()).await;
        signals.abort();
        result
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = Listener::from_tcp(listener, self.config.listener.max_connections);
        self.serve(listener, shutdown).await
    }

    async fn serve(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let app = self.router();
        let addr = listener.local_addr()?;
        let grace = self.config.timeouts.shutdown_grace();
        let settings = ConnectionSettings {
            read_header: self.config.timeouts.read_header(),
            idle: self.config.timeouts.idle(),
        };

        self.phase.advance(ServerPhase::Running);
        tracing::info!(
            address = %addr,
            upstream = %self.state.upstream,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let connection_shutdown = shutdown.clone();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            permit,
                            app.clone(),
                            settings,
                            connection_shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        self.phase.advance(ServerPhase::ShuttingDown);
        drop(listener);
        tracing::info!(
            in_flight = connections.len(),
            grace_secs = grace.as_secs(),
            "Shutting down, draining connections"
        );

        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::error!(
                remaining = connections.len(),
                "Shutdown grace period exceeded, aborting connections"
            );
            connections.abort_all();
            while connections.join_next().await.is_some() {}
        }

        self.phase.advance(ServerPhase::Stopped);
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Serve one HTTP/1.1 connection until it closes or shutdown drains it.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    permit: ConnectionPermit,
    app: Router,
    settings: ConnectionSettings,
    mut shutdown: ShutdownSignal,
) {
    let guard = ConnectionGuard::new(permit);
    let connection_id = guard.id();
    tracing::trace!(connection_id = %connection_id, peer = %peer, "Connection opened");

    let io = TokioIo::new(IdleTimeout::new(stream, settings.idle));
    let service = service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        app.clone().oneshot(request)
    });

    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(settings.read_header)
        .serve_connection(io, service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!(connection_id = %connection_id, peer = %peer, error = %e, "Connection ended with error");
    }
    drop(guard);
}
