//! End-to-end behavior of the gateway routes.

use axum::http::StatusCode;
use graphql_gateway::http::ServerError;
use graphql_gateway::lifecycle::startup::build_gateway;
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn requests_without_bearer_never_reach_upstream() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;
    let client = common::client();

    let attempts: [Option<&str>; 4] = [None, Some("Basic dXNlcjpwYXNz"), Some("bearer token"), Some("Bearertoken")];
    for auth in attempts {
        let mut request = client.post(gateway.url("/api/graphql")).body(r#"{"query":"{ me { id } }"}"#);
        if let Some(value) = auth {
            request = request.header("Authorization", value);
        }
        let res = request.send().await.expect("gateway unreachable");

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "auth header {:?}", auth);
        common::assert_cors(res.headers());
        assert_eq!(res.text().await.unwrap(), "Unauthorized");
    }

    assert_eq!(backend.count(), 0, "no request may be forwarded without a bearer prefix");
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn bearer_request_is_forwarded_and_relayed() {
    let backend = common::start_recording_backend(StatusCode::OK, r#"{"data":{"me":{"id":"1"}}}"#).await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client()
        .post(gateway.url("/api/graphql?operationName=Me"))
        .header("Authorization", "Bearer anything")
        .header("Content-Type", "application/json")
        .header("X-Client-Version", "7")
        .body(r#"{"query":"{ me { id } }"}"#)
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    common::assert_cors(res.headers());
    assert_eq!(res.headers()["x-upstream"], "mock");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), r#"{"data":{"me":{"id":"1"}}}"#);

    assert_eq!(backend.count(), 1);
    let seen = backend.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path_and_query, "/v1/graphql?operationName=Me");
    assert_eq!(&seen.body[..], br#"{"query":"{ me { id } }"}"#);
    assert_eq!(seen.headers["authorization"], "Bearer anything");
    assert_eq!(seen.headers["content-type"], "application/json");
    assert_eq!(seen.headers["x-client-version"], "7");
    assert_eq!(seen.headers["host"], backend.addr.to_string().as_str());
    assert_eq!(seen.headers["x-forwarded-for"], "127.0.0.1");
    assert_eq!(seen.headers["x-forwarded-host"], gateway.addr.to_string().as_str());
    assert_eq!(seen.headers["x-forwarded-proto"], "http");
    assert!(seen.headers.contains_key("x-request-id"));

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn get_requests_are_forwarded_too() {
    let backend = common::start_recording_backend(StatusCode::OK, "ok").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client()
        .get(gateway.url("/api/graphql?query=%7Bme%7D"))
        .header("Authorization", "Bearer t")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let seen = backend.last();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path_and_query, "/v1/graphql?query=%7Bme%7D");
    assert!(seen.body.is_empty());

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn upstream_error_status_passes_through() {
    let backend = common::start_recording_backend(StatusCode::SERVICE_UNAVAILABLE, "engine down").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client()
        .post(gateway.url("/api/graphql"))
        .header("Authorization", "Bearer t")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    common::assert_cors(res.headers());
    assert_eq!(res.text().await.unwrap(), "engine down");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let dead = common::closed_port().await;
    let config = common::test_config(&format!("http://{}/v1/graphql", dead));
    let gateway = common::spawn_gateway(build_gateway(config).unwrap()).await;

    let res = common::client()
        .post(gateway.url("/api/graphql"))
        .header("Authorization", "Bearer t")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    common::assert_cors(res.headers());

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected_before_upstream() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let mut config = common::test_config(&backend.graphql_url());
    config.security.max_body_size = 16;
    let gateway = common::spawn_gateway(build_gateway(config).unwrap()).await;
    let client = common::client();

    let res = client
        .post(gateway.url("/api/graphql"))
        .header("Authorization", "Bearer t")
        .body(r#"{"query":"{ me { id name email } }"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    common::assert_cors(res.headers());
    assert_eq!(backend.count(), 0);

    let res = client
        .post(gateway.url("/api/graphql"))
        .header("Authorization", "Bearer t")
        .body(r#"{"query":"{a}"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.count(), 1);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn preflight_is_answered_without_running_handlers() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;
    let client = common::client();

    for path in ["/api/graphql", "/api/auth/signin"] {
        let res = client
            .request(reqwest::Method::OPTIONS, gateway.url(path))
            .header("Origin", "https://app.example")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK, "preflight on {}", path);
        common::assert_cors(res.headers());
        assert!(res.bytes().await.unwrap().is_empty());
    }

    assert_eq!(backend.count(), 0);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn signin_is_an_explicit_placeholder() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client()
        .post(gateway.url("/api/auth/signin"))
        .basic_auth("user", Some("pass"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
    common::assert_cors(res.headers());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_implemented");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn static_files_are_served_without_cors() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;
    let client = common::client();

    let expected = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html")).unwrap();
    let res = client.get(gateway.url("/static/index.html")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("access-control-allow-origin").is_none());
    assert_eq!(res.text().await.unwrap(), expected);

    let res = client.get(gateway.url("/static/missing.html")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client().get(gateway.url("/api/graphql/extra")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let backend = common::start_recording_backend(StatusCode::OK, "{}").await;
    let gateway = common::spawn_gateway(build_gateway(common::test_config(&backend.graphql_url())).unwrap()).await;

    let res = common::client()
        .post(gateway.url("/api/graphql"))
        .header("Authorization", "Bearer t")
        .header("X-Request-Id", "trace-42")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-42");
    assert_eq!(backend.last().headers["x-request-id"], "trace-42");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn start_fails_when_port_is_taken() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = common::test_config("http://127.0.0.1:1/v1/graphql");
    config.listener.bind_address = occupied.local_addr().unwrap().to_string();

    let server = build_gateway(config).unwrap();
    let err = server.start().await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }), "unexpected error: {}", err);
}

#[test]
fn invalid_upstream_is_rejected_at_construction() {
    let config = common::test_config("not a url");
    assert!(matches!(build_gateway(config), Err(ServerError::Upstream(_))));
}

#[test]
fn duplicate_route_is_rejected() {
    let mut server = build_gateway(common::test_config("http://127.0.0.1:1/v1/graphql")).unwrap();
    let err = server.handle("/api/graphql", || async { "again" }).unwrap_err();
    assert_eq!(err.to_string(), "route '/api/graphql' is already registered");
}
