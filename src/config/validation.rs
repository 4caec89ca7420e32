//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts, connection limit and body limit > 0)
//! - Check the upstream URL and the bind address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be greater than zero",
        ));
    }

    let timeouts = [
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.write_secs", config.timeouts.write_secs),
        ("timeouts.idle_secs", config.timeouts.idle_secs),
        ("timeouts.read_header_secs", config.timeouts.read_header_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if let Err(message) = check_upstream_url(&config.upstream.graphql_url) {
        errors.push(ValidationError::new("upstream.graphql_url", message));
    }

    let prefix = &config.static_files.prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "static_files.prefix",
            "must start with '/', be non-empty and have no trailing '/'",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse the upstream URL, requiring an http(s) scheme and a host.
pub fn parse_upstream_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{}' is not a URL: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err(format!("'{}' has no host", raw));
    }
    Ok(url)
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    parse_upstream_url(raw).map(|_| ())
}
