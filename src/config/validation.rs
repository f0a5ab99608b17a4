//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Every problem is reported,
//! not just the first.

use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroListenerPort,
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroListenerPort);
    }
    if config.listener.bind_host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.bind_host" });
    }
    if config.listener.tls.cert_path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.tls.cert_path" });
    }
    if config.listener.tls.key_path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.tls.key_path" });
    }
    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "upstream.host" });
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.limits.max_service_segment_len == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_service_segment_len" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
