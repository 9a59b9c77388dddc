//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {var} has invalid value '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file. The result is not validated yet,
/// since environment and command-line overrides still apply on top.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Validate a fully layered configuration.
pub fn finalize(config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `PROXY_*` overrides from the process environment.
pub fn apply_env(config: &mut ProxyConfig) -> Result<(), ConfigError> {
    apply_env_from(config, |name| std::env::var(name).ok())
}

/// Apply `PROXY_*` overrides using `lookup` to read variables.
pub fn apply_env_from<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("PROXY_HOST") {
        config.listener.host = host;
    }
    if let Some(port) = parsed(&lookup, "PROXY_PORT")? {
        config.listener.port = port;
    }
    if let Some(limit) = parsed(&lookup, "PROXY_MAX_CONCURRENT_REQUESTS")? {
        config.forwarding.max_concurrent_requests = limit;
    }
    if let Some(timeout) = parsed(&lookup, "PROXY_REQUEST_TIMEOUT")? {
        config.forwarding.request_timeout_secs = timeout;
    }
    if let Some(max) = parsed(&lookup, "PROXY_MAX_CONNECTIONS")? {
        config.pool.max_connections = max;
    }
    if let Some(keepalive) = parsed(&lookup, "PROXY_MAX_KEEPALIVE_CONNECTIONS")? {
        config.pool.max_keepalive_connections = keepalive;
    }
    if let Some(expiry) = parsed(&lookup, "PROXY_KEEPALIVE_EXPIRY")? {
        config.pool.keepalive_expiry_secs = expiry;
    }
    if let Some(level) = lookup("PROXY_LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}
