//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Forwarding engine settings (admission capacity, timeout).
    pub forwarding: ForwardingConfig,

    /// Outbound connection pool settings.
    pub pool: PoolConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Outbound request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        secs(self.forwarding.request_timeout_secs, DEFAULT_TIMEOUT)
    }

    /// Idle connection expiry as a `Duration`.
    pub fn keepalive_expiry(&self) -> Duration {
        secs(self.pool.keepalive_expiry_secs, DEFAULT_KEEPALIVE_EXPIRY)
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

// Validation rejects non-finite and non-positive values; this only guards
// configs that were built in code and never validated.
fn secs(value: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(fallback)
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Forwarding engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Maximum forwarding operations in flight at once.
    pub max_concurrent_requests: usize,

    /// Outbound request timeout in seconds.
    pub request_timeout_secs: f64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 100,
            request_timeout_secs: 30.0,
        }
    }
}

/// Outbound connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum concurrent upstream connections.
    pub max_connections: usize,

    /// Maximum idle connections kept alive per upstream host.
    pub max_keepalive_connections: usize,

    /// Seconds an idle connection is kept before being closed.
    pub keepalive_expiry_secs: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 200,
            max_keepalive_connections: 50,
            keepalive_expiry_secs: 30.0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.forwarding.max_concurrent_requests, 100);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.pool.max_connections, 200);
        assert_eq!(config.pool.max_keepalive_connections, 50);
        assert_eq!(config.keepalive_expiry(), Duration::from_secs(30));
    }

    #[test]
    fn fractional_timeouts_are_kept() {
        let mut config = ProxyConfig::default();
        config.forwarding.request_timeout_secs = 2.5;
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn invalid_durations_fall_back() {
        let mut config = ProxyConfig::default();
        config.forwarding.request_timeout_secs = f64::NAN;
        config.pool.keepalive_expiry_secs = -1.0;
        assert_eq!(config.request_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.keepalive_expiry(), DEFAULT_KEEPALIVE_EXPIRY);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [forwarding]
            max_concurrent_requests = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.forwarding.max_concurrent_requests, 8);
        assert_eq!(config.forwarding.request_timeout_secs, 30.0);
        assert_eq!(config.listener.port, 8000);
    }
}
