//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Header name to the list of values sent for it.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, connection and body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Remote destinations keyed by name.
    pub destinations: BTreeMap<String, DestinationConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Maximum accepted inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a whole inbound request, dispatch included.
    pub request_secs: u64,

    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one outbound delivery in seconds.
    pub outbound_secs: u64,

    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connect_secs: 5,
            outbound_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
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
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One remote HTTP destination.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DestinationConfig {
    /// HTTP method; empty means GET.
    #[serde(default)]
    pub method: String,

    /// Absolute http(s) URL.
    pub url: String,

    /// Optional authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Static headers merged onto every outbound request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: HeaderValues,

    /// Body template chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyConfig>,
}

impl DestinationConfig {
    /// Template sources in declaration order (empty when no body is configured).
    pub fn templates(&self) -> &[String] {
        self.body
            .as_ref()
            .map(|body| body.templates.as_slice())
            .unwrap_or_default()
    }
}

/// Authentication settings for a destination.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthConfig>,
}

/// Basic auth whose secrets live in files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    #[serde(alias = "usernameFile")]
    pub username_file: PathBuf,

    #[serde(alias = "passwordFile")]
    pub password_file: PathBuf,
}

/// Body rendering settings for a destination.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BodyConfig {
    /// Template sources evaluated in order; the last one's output is the body.
    #[serde(default)]
    pub templates: Vec<String>,
}
