//! Startup configuration assembly.
//!
//! Layers, lowest first: built-in defaults, the optional TOML file, the
//! `PROXY_*` environment, command-line flags. The result is validated once
//! and never re-read.

use crate::config::args::CliArgs;
use crate::config::loader::{apply_env, finalize, load_config};
use crate::config::{ConfigError, ProxyConfig};

/// Build the effective configuration for this process.
pub fn resolve_config(args: &CliArgs) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_env(&mut config)?;
    args.apply(&mut config);
    finalize(config)
}
