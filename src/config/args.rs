//! Command-line flags.
//!
//! Flags are the last configuration layer: they override both the config
//! file and the `PROXY_*` environment variables.

use clap::Parser;
use std::path::PathBuf;

use crate::config::schema::ProxyConfig;

#[derive(Debug, Default, Parser)]
#[command(name = "httpkit-proxy")]
#[command(about = "Forwarding HTTP proxy: /proxy/{host}:{port}/{path} relays to the target", long_about = None)]
pub struct CliArgs {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum forwarding operations in flight at once.
    #[arg(long)]
    pub max_concurrent_requests: Option<usize>,

    /// Outbound request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Maximum concurrent upstream connections.
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Maximum idle upstream connections kept per host.
    #[arg(long)]
    pub max_keepalive_connections: Option<usize>,

    /// Seconds before an idle upstream connection is closed.
    #[arg(long)]
    pub keepalive_expiry: Option<f64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Overlay every flag that was given onto `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(limit) = self.max_concurrent_requests {
            config.forwarding.max_concurrent_requests = limit;
        }
        if let Some(timeout) = self.timeout {
            config.forwarding.request_timeout_secs = timeout;
        }
        if let Some(max) = self.max_connections {
            config.pool.max_connections = max;
        }
        if let Some(keepalive) = self.max_keepalive_connections {
            config.pool.max_keepalive_connections = keepalive;
        }
        if let Some(expiry) = self.keepalive_expiry {
            config.pool.keepalive_expiry_secs = expiry;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
