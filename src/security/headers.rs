//! Header manipulation for proxied traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//!
//! # Design Decisions
//! - Client IP is appended to an existing X-Forwarded-For chain
//! - Headers listed in `Connection` are treated as hop-by-hop too

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use std::net::IpAddr;

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
static PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Remove headers that only apply to a single transport hop.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    let fixed = [
        &header::CONNECTION,
        &KEEP_ALIVE,
        &PROXY_CONNECTION,
        &header::PROXY_AUTHENTICATE,
        &header::PROXY_AUTHORIZATION,
        &header::TE,
        &header::TRAILER,
        &header::TRANSFER_ENCODING,
        &header::UPGRADE,
    ];
    for name in fixed {
        headers.remove(name);
    }
}

/// Record the original client, host and scheme on an outbound request.
pub fn set_forwarded_headers(
    headers: &mut HeaderMap,
    client_ip: Option<IpAddr>,
    original_host: Option<HeaderValue>,
    proto: &'static str,
) {
    if let Some(ip) = client_ip {
        let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) if !prior.is_empty() => format!("{}, {}", prior, ip),
            _ => ip.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR.clone(), value);
        }
    }

    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST.clone(), host);
    }
    headers.insert(X_FORWARDED_PROTO.clone(), HeaderValue::from_static(proto));
}
