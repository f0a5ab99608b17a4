//! Configuration loading: defaults, then an optional TOML file, then the
//! process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, DEFAULT_PORT};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the colon-delimited service list.
pub const SERVICES_ENV: &str = "SERVICES";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Cannot find services: SERVICES is not set")]
    MissingServices,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration using the real process environment.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load, overlay `env`, and validate configuration.
///
/// Fails with [`ConfigError::MissingServices`] when no layer supplied a
/// service list.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, env);

    if config.services.is_none() {
        return Err(ConfigError::MissingServices);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
pub fn apply_env<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(services) = env(SERVICES_ENV) {
        config.services = Some(services);
    }

    if let Some(raw) = env("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) if port != 0 => config.listener.port = port,
            _ => {
                tracing::warn!(
                    value = %raw,
                    default = DEFAULT_PORT,
                    "PORT is not a usable port number, using default"
                );
                config.listener.port = DEFAULT_PORT;
            }
        }
    }

    if let Some(cert) = env("TLS_CERT") {
        config.listener.tls.cert_path = cert;
    }
    if let Some(key) = env("TLS_KEY") {
        config.listener.tls.key_path = key;
    }
    if let Some(host) = env("UPSTREAM_HOST") {
        config.upstream.host = host;
    }
    if let Some(addr) = env("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }
}
