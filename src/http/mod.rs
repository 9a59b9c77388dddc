//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, panic recovery)
//!     → request.rs (raw path → InboundRequest)
//!     → proxy::engine (forward and relay)
//!     → response.rs (the proxy's own responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, ServerError};
