//! Render admission and concurrency limits.
//!
//! Two semaphores: `admission` bounds how many jobs may be running or
//! waiting for a render slot, `slots` bounds how many render at once. A
//! job that cannot be admitted is rejected with
//! [`ReelError::Overloaded`] rather than queued without bound.

use std::sync::Arc;

use reels_core::error::ReelError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct RenderLimiter {
    admission: Arc<Semaphore>,
    slots: Arc<Semaphore>,
    max_concurrent: usize,
    max_queued: usize,
}

/// A job admitted to the render queue. Holds its queue place until
/// dropped.
#[derive(Debug)]
pub struct Admission {
    permit: OwnedSemaphorePermit,
    slots: Arc<Semaphore>,
}

/// Permission to run one render. Releases both the render slot and the
/// queue place when dropped.
pub struct RenderSlot {
    _admission: OwnedSemaphorePermit,
    _slot: OwnedSemaphorePermit,
}

impl RenderLimiter {
    /// `max_concurrent` is raised to at least 1.
    pub fn new(max_concurrent: usize, max_queued: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            admission: Arc::new(Semaphore::new(max_concurrent + max_queued)),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            max_queued,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_concurrent + self.max_queued
    }

    /// Renders currently holding a slot.
    pub fn active(&self) -> usize {
        self.max_concurrent - self.slots.available_permits()
    }

    /// Jobs admitted, rendering or waiting.
    pub fn admitted(&self) -> usize {
        self.capacity() - self.admission.available_permits()
    }

    /// Take a place in the render queue without waiting.
    pub fn admit(&self) -> Result<Admission, ReelError> {
        let permit = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| ReelError::Overloaded {
                capacity: self.capacity(),
            })?;
        Ok(Admission {
            permit,
            slots: Arc::clone(&self.slots),
        })
    }
}

impl Admission {
    /// Wait for a free render slot.
    pub async fn wait_for_slot(self) -> Result<RenderSlot, ReelError> {
        let slot = self
            .slots
            .acquire_owned()
            .await
            .map_err(|_| ReelError::EngineUnavailable("render limiter closed".into()))?;
        Ok(RenderSlot {
            _admission: self.permit,
            _slot: slot,
        })
    }
}
