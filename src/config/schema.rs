//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the firewalling reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// The single upstream origin this proxy fronts.
    pub upstream: UpstreamConfig,

    /// Admission allow-lists (domains, methods).
    pub admission: AdmissionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// CSV request-log settings.
    pub logging: LogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Whether clients reach this listener over TLS terminated outside the
    /// process. Only feeds the per-request secure flag; certificates are
    /// never handled in-process.
    pub tls_offloaded: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
            max_connections: 10_000,
            tls_offloaded: false,
        }
    }
}

/// The single upstream origin server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin address (e.g., "127.0.0.1:80"), reached over plain HTTP.
    pub address: String,

    /// Maximum buffered response body size in bytes.
    pub max_response_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:80".to_string(),
            max_response_bytes: 1_000_000,
        }
    }
}

/// Admission allow-lists.
///
/// Both lists are built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Accepted host names. Exact, case-sensitive matches only; no
    /// wildcards, no suffix matching.
    pub domains: Vec<String>,

    /// Accepted HTTP method tokens (case-insensitive).
    pub methods: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            methods: vec!["GET".to_string()],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream forward timeout in seconds (connect + response + body).
    pub upstream_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 3,
            request_secs: 30,
        }
    }
}

/// CSV request-log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enable the CSV request log.
    pub enabled: bool,

    /// Folder the log file is created in (one file per process run).
    pub folder: String,

    /// File-name suffix appended to the date-time stamp prefix.
    pub suffix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            folder: "logs".to_string(),
            suffix: "frontgate.csv".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level for diagnostic tracing (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
