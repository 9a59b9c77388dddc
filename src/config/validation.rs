//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and the
//! relationships between fields. Every problem is reported, not just the
//! first one, so a bad config file can be fixed in a single pass.

use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::ProxyConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("forwarding.max_concurrent_requests must be greater than zero")]
    ZeroConcurrency,

    #[error("{field} ({value}) exceeds the maximum of {max}")]
    TooLarge { field: &'static str, value: usize, max: usize },

    #[error("{field} must be a positive number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("pool.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("pool.max_keepalive_connections ({keepalive}) exceeds pool.max_connections ({max})")]
    KeepaliveExceedsConnections { keepalive: usize, max: usize },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if config.forwarding.max_concurrent_requests == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    check_upper_bound(
        &mut errors,
        "forwarding.max_concurrent_requests",
        config.forwarding.max_concurrent_requests,
    );

    check_duration(
        &mut errors,
        "forwarding.request_timeout_secs",
        config.forwarding.request_timeout_secs,
    );
    check_duration(
        &mut errors,
        "pool.keepalive_expiry_secs",
        config.pool.keepalive_expiry_secs,
    );

    if config.pool.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    } else if config.pool.max_keepalive_connections > config.pool.max_connections {
        errors.push(ValidationError::KeepaliveExceedsConnections {
            keepalive: config.pool.max_keepalive_connections,
            max: config.pool.max_connections,
        });
    }
    check_upper_bound(
        &mut errors,
        "pool.max_connections",
        config.pool.max_connections,
    );

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duration(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(ValidationError::InvalidDuration { field, value });
    }
}

/// Both counts size a Tokio semaphore, which refuses more permits than this.
fn check_upper_bound(errors: &mut Vec<ValidationError>, field: &'static str, value: usize) {
    if value > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooLarge {
            field,
            value,
            max: Semaphore::MAX_PERMITS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = ProxyConfig::default();
        config.forwarding.max_concurrent_requests = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroConcurrency]);
    }

    #[test]
    fn counts_above_semaphore_limit_rejected() {
        let mut config = ProxyConfig::default();
        config.forwarding.max_concurrent_requests = usize::MAX;
        config.pool.max_connections = Semaphore::MAX_PERMITS + 1;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TooLarge {
                    field: "forwarding.max_concurrent_requests",
                    value: usize::MAX,
                    max: Semaphore::MAX_PERMITS,
                },
                ValidationError::TooLarge {
                    field: "pool.max_connections",
                    value: Semaphore::MAX_PERMITS + 1,
                    max: Semaphore::MAX_PERMITS,
                },
            ]
        );

        config.forwarding.max_concurrent_requests = Semaphore::MAX_PERMITS;
        config.pool.max_connections = Semaphore::MAX_PERMITS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.host = " ".into();
        config.forwarding.request_timeout_secs = 0.0;
        config.pool.keepalive_expiry_secs = f64::INFINITY;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyHost));
        assert!(errors.contains(&ValidationError::InvalidLogLevel("loud".into())));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidDuration { field: "forwarding.request_timeout_secs", .. }
        )));
    }

    #[test]
    fn keepalive_cannot_exceed_pool() {
        let mut config = ProxyConfig::default();
        config.pool.max_connections = 10;
        config.pool.max_keepalive_connections = 11;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::KeepaliveExceedsConnections { keepalive: 11, max: 10 }]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMetricsAddress("nowhere".into())]
        );
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = ProxyConfig::default();
        config.observability.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }
}
