//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::Request,
    http::{HeaderMap, Method, StatusCode},
    Router,
};
use graphql_gateway::config::GatewayConfig;
use graphql_gateway::http::{HttpServer, ServerError};
use graphql_gateway::lifecycle::Shutdown;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Mock upstream that records every request and answers with a fixed response.
pub struct RecordingBackend {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingBackend {
    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }

    /// Upstream GraphQL URL pointing at this backend.
    pub fn graphql_url(&self) -> String {
        format!("http://{}/v1/graphql", self.addr)
    }
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_recording_backend(status: StatusCode, reply: &'static str) -> RecordingBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorder = requests.clone();
    let app = Router::new().fallback(move |request: Request| {
        let recorder = recorder.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, 1024 * 1024).await.unwrap_or_default();
            recorder.lock().unwrap().push(Recorded {
                method: parts.method,
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_owned())
                    .unwrap_or_default(),
                headers: parts.headers,
                body,
            });
            (status, [("x-upstream", "mock")], reply)
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    RecordingBackend { addr, requests }
}

/// Address that refuses connections.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config suitable for tests: ephemeral port, repo `static/` directory.
pub fn test_config(graphql_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.graphql_url = graphql_url.into();
    config.static_files.dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();
    config
}

/// A server running in the background.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Bind an ephemeral port and run `server` on it.
pub async fn spawn_gateway(server: HttpServer) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    RunningGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn assert_cors(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type, Authorization");
}
