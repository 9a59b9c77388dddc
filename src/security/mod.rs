//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Forward request:
//!     → limits.rs (admission: bounded forwards in flight)
//!     → headers.rs (strip hop-by-hop request headers)
//!     → upstream
//!     → headers.rs (strip framing and identity response headers)
//! ```
//!
//! # Design Decisions
//! - Header rules are fixed lists, matched case-insensitively
//! - Admission suspends callers instead of rejecting them

pub mod headers;
pub mod limits;

pub use headers::{sanitize_request_headers, sanitize_response_headers};
pub use limits::{AdmissionClosed, AdmissionController, AdmissionPermit};
