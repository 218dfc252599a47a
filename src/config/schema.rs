//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Remote authentication settings.
    pub auth: AuthConfig,

    /// Request body rewrite settings.
    pub body_rewrite: BodyRewriteConfig,

    /// Forwarding settings for backend calls.
    pub upstream: UpstreamConfig,

    /// Route definitions mapping requests to backends.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Authentication backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Global switch. When false, no request is authenticated.
    pub enabled: bool,

    /// Base URL of the identity service (e.g., "http://auth:8081").
    pub service_url: String,

    /// Path of the token validation endpoint, appended to `service_url`.
    pub validate_endpoint: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Response timeout in milliseconds.
    pub response_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_url: "http://127.0.0.1:8081".to_string(),
            validate_endpoint: "/auth/validate".to_string(),
            connect_timeout_ms: 5_000,
            response_timeout_ms: 10_000,
        }
    }
}

/// Identity injection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyRewriteConfig {
    /// Maximum body size buffered for rewriting, in bytes.
    pub max_body_size: usize,

    /// HTTP methods whose JSON bodies get the identity injected.
    pub methods: Vec<String>,

    /// JSON field that receives the identity id.
    pub identity_field: String,
}

impl Default for BodyRewriteConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            methods: vec!["POST".to_string()],
            identity_field: "operatorId".to_string(),
        }
    }
}

/// Backend forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Deadline for a forwarded request to produce response headers.
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Route configuration mapping requests to a backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact match).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Base URL of the backend service (e.g., "http://127.0.0.1:3000").
    pub upstream: String,

    /// Public routes skip authentication and body rewriting.
    #[serde(default)]
    pub public: bool,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
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
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
