//! GraphQL reverse proxy handler.
//!
//! # Responsibilities
//! - Require an `Authorization: Bearer ...` header
//! - Forward method, headers and body to the fixed upstream endpoint
//! - Stream the upstream response back unchanged
//!
//! # Design Decisions
//! - Only the literal `Bearer ` prefix is checked; the token is never decoded
//! - Upstream statuses pass through; only transport failures become 502
//! - Request bodies are buffered up to `security.max_body_size`; larger ones get 413
//! - No retries and no proxy-specific timeout

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::net::SocketAddr;
use std::time::Instant;
use url::Url;

use crate::http::request::request_id_of;
use crate::http::server::GatewayState;
use crate::observability::metrics;
use crate::security::headers::{set_forwarded_headers, strip_hop_by_hop};

/// Prefix an `Authorization` value must start with.
pub const BEARER_PREFIX: &str = "Bearer ";

/// True when the `Authorization` header starts with `Bearer `.
pub fn has_bearer_prefix(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(BEARER_PREFIX))
}

/// Upstream URL for a request carrying `query`.
pub fn upstream_url(base: &Url, query: Option<&str>) -> Url {
    let mut url = base.clone();
    if query.is_some() {
        url.set_query(query);
    }
    url
}

/// Forward an authorized request to the upstream GraphQL endpoint.
pub async fn graphql_proxy_handler(
    State(state): State<GatewayState>,
    request: Request,
) -> Response {
    let request_id = request_id_of(request.headers()).to_owned();

    if !has_bearer_prefix(request.headers()) {
        tracing::debug!(request_id = %request_id, "Missing bearer credential");
        metrics::record_unauthorized();
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    let url = upstream_url(&state.upstream, parts.uri.query());

    let mut headers = parts.headers;
    let original_host = headers.remove(header::HOST);
    strip_hop_by_hop(&mut headers);
    set_forwarded_headers(&mut headers, client_ip, original_host, "http");

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        upstream = %url,
        "Forwarding request"
    );

    let body = match Limited::new(body, state.max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::debug!(
                request_id = %request_id,
                limit = state.max_body_size,
                "Request body too large"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    let mut outbound = state.client.request(parts.method, url).headers(headers);
    if !body.is_empty() {
        outbound = outbound.body(body);
    }

    let start_time = Instant::now();
    match outbound.send().await {
        Ok(upstream) => {
            let status = upstream.status();
            metrics::record_upstream(status.as_u16(), start_time);

            let mut response_headers = upstream.headers().clone();
            strip_hop_by_hop(&mut response_headers);

            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Upstream request failed");
            metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16(), start_time);
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}
