//! Admission control for forwarding operations.
//!
//! # Responsibilities
//! - Bound the number of forwarding operations in flight at any instant
//! - Suspend (not reject) operations while the bound is reached
//! - Release capacity on every exit path via an RAII permit
//!
//! # Design Decisions
//! - Independent of the inbound connection count: the server keeps
//!   accepting while forwards wait here
//! - Waiters are served in arrival order (Tokio's semaphore is fair);
//!   starvation under sustained overload is accepted
//! - A permit is released exactly once, when it is dropped
//! - Capacity is capped at `Semaphore::MAX_PERMITS`

use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Returned when the controller was closed while waiting for a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admission controller is closed")]
pub struct AdmissionClosed;

/// A counting gate with a fixed capacity.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionController {
    /// Create a controller admitting at most `capacity` operations at once.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get().min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(&self) -> Result<AdmissionPermit, AdmissionClosed> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AdmissionClosed)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Stop admitting. Pending and future `acquire` calls fail; permits
    /// already handed out stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Operations currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

/// A held admission slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    /// Give the slot back explicitly. Equivalent to dropping the permit.
    pub fn release(self) {}
}
