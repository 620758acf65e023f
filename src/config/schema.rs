//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Root configuration for the form relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP front door settings.
    pub http: HttpConfig,

    /// Datagram transport between front door and store writer.
    pub transport: TransportConfig,

    /// Document store location.
    pub storage: StorageConfig,

    /// Pages and static files served on GET.
    pub site: SiteConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// HTTP front door configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (body read included) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_size: 64 * 1024,
        }
    }
}

/// Datagram transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Address the store writer listens on and the front door sends to.
    pub address: String,

    /// Receive buffer per datagram; longer payloads are truncated.
    pub buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".to_string(),
            buffer_size: 1024,
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON document, relative to the working directory.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "storage/data.json".to_string(),
        }
    }
}

/// Site content configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding pages and static files.
    pub root: String,

    /// Page served on `GET /`.
    pub index_page: String,

    /// Page served on `GET /message`.
    pub message_page: String,

    /// Page served with 404 when nothing matches.
    pub not_found_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            index_page: "index.html".to_string(),
            message_page: "message.html".to_string(),
            not_found_page: "error.html".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
