//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Keep timeout failures distinct from other errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - One configured duration bounds each wait (pool slot, connect, response
//!   head, every body read); a healthy stream may run longer in total
//! - No retries: a timeout is reported once and the operation ends

use std::future::Future;
use std::time::Duration;

/// A deadline elapsed before the wrapped operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{stage} timed out after {limit:?}")]
pub struct Elapsed {
    pub stage: Stage,
    pub limit: Duration,
}

/// Which wait exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for a free upstream connection slot.
    Pool,
    /// Connecting and waiting for the response head.
    Response,
    /// Waiting for the next body chunk.
    Read,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Pool => write!(f, "waiting for a pooled connection"),
            Stage::Response => write!(f, "waiting for the upstream response"),
            Stage::Read => write!(f, "reading the upstream body"),
        }
    }
}

/// Run `future` with a deadline of `limit`.
pub async fn with_deadline<F: Future>(
    stage: Stage,
    limit: Duration,
    future: F,
) -> Result<F::Output, Elapsed> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| Elapsed { stage, limit })
}
