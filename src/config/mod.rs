//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → PROXY_* environment variables (loader.rs)
//!     → command-line flags (args.rs)
//!     → validation.rs (semantic checks, all errors reported)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the forwarding core never re-reads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::ForwardingConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PoolConfig;
pub use schema::ProxyConfig;
