//! The forwarding core.
//!
//! # Data Flow
//! ```text
//! /proxy/{target} request
//!     → target.rs  (scheme, host, port, path, query → upstream URL)
//!     → engine.rs  (headers, admission, transport)
//!     → relay.rs   (stream body back, release admission)
//!     → error.rs   (400 / 502 / 500 with a JSON detail)
//! ```

pub mod engine;
pub mod error;
pub mod relay;
pub mod target;

pub use engine::{ForwardingEngine, InboundRequest};
pub use error::ForwardError;
pub use target::{Scheme, Target};
