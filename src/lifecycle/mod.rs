//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Defaults → TOML file → PROXY_* env → CLI flags → Validate
//!
//! Resources (context.rs):
//!     init() before accepting → lazy init on a cold forward → shutdown()
//!
//! Shutdown (signals.rs, http::server):
//!     SIGTERM/SIGINT → stop accepting → drain → detach resources
//! ```

pub mod context;
pub mod signals;
pub mod startup;

pub use context::{ProxyContext, Resources, TransportFactory};
