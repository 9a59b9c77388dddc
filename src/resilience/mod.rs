//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (pool slot, response head, each body read)
//!     → On expiry: reported as an upstream failure, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream wait has a deadline
//! - No retries or backoff: a failed forward is surfaced to the caller once

pub mod timeouts;
