use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{MlError, Result};

/// Per-process cap on concurrent classifications
pub struct AdmissionControl {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    queue_timeout: Duration,
}

/// Held for the duration of one classification; the slot frees on drop
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionControl {
    pub fn new(max_concurrent: usize, queue_timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            queue_timeout,
        }
    }

    /// Wait up to the queue timeout for a free slot. A zero timeout tries once.
    pub async fn acquire(&self) -> Result<AdmissionPermit> {
        let busy = || MlError::Busy {
            max_concurrent: self.max_concurrent,
        };

        let permit = if self.queue_timeout.is_zero() {
            self.semaphore.clone().try_acquire_owned().map_err(|_| busy())?
        } else {
            match tokio::time::timeout(self.queue_timeout, self.semaphore.clone().acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) | Err(_) => {
                    tracing::warn!(
                        max_concurrent = self.max_concurrent,
                        waited_ms = self.queue_timeout.as_millis() as u64,
                        "No classification slot available"
                    );
                    return Err(busy());
                }
            }
        };

        Ok(AdmissionPermit { _permit: permit })
    }

    pub fn active(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
