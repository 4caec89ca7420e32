//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream GraphQL endpoint used when no config file overrides it.
pub const DEFAULT_GRAPHQL_URL: &str = "https://DOMAIN/api/graphql-engine/v1/graphql";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Per-connection and shutdown timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream GraphQL endpoint.
    pub upstream: UpstreamConfig,

    /// Static file serving.
    pub static_files: StaticFilesConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration, all values in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Maximum wait for each chunk of a request body.
    pub read_secs: u64,

    /// Maximum time to produce a response, and to wait for each chunk of its body.
    pub write_secs: u64,

    /// Connection closed after this long without any traffic.
    pub idle_secs: u64,

    /// Maximum time to receive the request head.
    pub read_header_secs: u64,

    /// Grace period given to in-flight requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            write_secs: 10,
            idle_secs: 30,
            read_header_secs: 2,
            shutdown_grace_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn read_header(&self) -> Duration {
        Duration::from_secs(self.read_header_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Full URL requests on the GraphQL route are forwarded to.
    pub graphql_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
        }
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory files are served from.
    pub dir: String,

    /// URL prefix, stripped before the filesystem lookup.
    pub prefix: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            dir: "static".to_string(),
            prefix: "/static".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Largest request body forwarded upstream, in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
