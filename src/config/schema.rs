//! Configuration schema definitions.
//!
//! All sections derive Serde traits so a TOML file can override any subset
//! of the defaults; the environment is layered on top by the loader.

use serde::{Deserialize, Serialize};

/// Default gateway port when `PORT` is absent or unusable.
pub const DEFAULT_PORT: u16 = 8443;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Colon-delimited list of service names (e.g. `user:project:task`).
    pub services: Option<String>,

    /// Listener configuration (bind address, TLS material).
    pub listener: ListenerConfig,

    /// Where and how upstream services are reached.
    pub upstream: UpstreamConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// CORS response headers.
    pub cors: CorsConfig,

    /// Static diagnostic page.
    pub diagnostics: DiagnosticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// TCP port for the TLS listener.
    pub port: u16,

    /// TLS certificate and key. Both are mandatory.
    pub tls: TlsConfig,
}

impl ListenerConfig {
    /// `host:port` string suitable for `SocketAddr` parsing.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tls: TlsConfig::default(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
        }
    }
}

/// Upstream (backend) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host every backend listens on; only the port differs per service.
    pub host: String,

    /// Deadline for one forwarding attempt, response body included.
    pub timeout_secs: u64,

    /// Largest upstream response body the relay will buffer.
    pub max_response_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            timeout_secs: 5,
            max_response_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest accepted service segment, in bytes.
    pub max_service_segment_len: usize,

    /// Largest request body the connection context will accumulate.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_service_segment_len: 64,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for a client request, upload included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// CORS headers attached to preflight replies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, PATCH, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
        }
    }
}

/// Fixed diagnostic page, served for `GET` on `path` without routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub path: String,
    pub page: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            path: "/demonstracija".to_string(),
            page: "<html><body><h1>HTTPS DEMONSTRACIJA</h1></body></html>".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gateway_contract() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.port, 8443);
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.host, "localhost");
        assert_eq!(config.listener.tls.cert_path, "cert.pem");
        assert!(config.services.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            services = "user:project"

            [upstream]
            timeout_secs = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.services.as_deref(), Some("user:project"));
        assert_eq!(config.upstream.timeout_secs, 2);
        assert_eq!(config.upstream.host, "localhost");
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8443");
    }
}
