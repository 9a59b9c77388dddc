//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding engine
//!     → transport.rs (pooled upstream client, connection slots)
//!     → upstream server
//!     → lazy body stream back to the engine
//! ```
//!
//! # Design Decisions
//! - One long-lived client per process; sockets are reused across forwards
//! - Concurrent upstream exchanges are bounded by a semaphore
//! - The client is reached through the `Transport` trait

pub mod transport;

pub use transport::{HttpTransport, OutboundRequest, Transport, TransportConfig, TransportError, UpstreamResponse};
