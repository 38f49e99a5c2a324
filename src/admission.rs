//! Bounded admission for heavy jobs.
//!
//! A fixed pool of slots guards downloads. Callers wait at most
//! [`ADMISSION_WAIT`] for a slot and are turned away after that instead of
//! queueing. A granted [`SlotPermit`] returns its slot when dropped, so every
//! exit path of a job (success, failure, panic, dropped future) releases it
//! exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::JobError;

/// How long a caller may wait for a slot.
pub const ADMISSION_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no admission slot freed within {waited:?}")]
pub struct AdmissionDenied {
    pub waited: Duration,
}

impl From<AdmissionDenied> for JobError {
    fn from(_: AdmissionDenied) -> Self {
        JobError::ServerBusy
    }
}

#[derive(Debug)]
pub struct AdmissionController {
    slots: Arc<Semaphore>,
    max_concurrent: usize,
    max_wait: Duration,
    active: Arc<AtomicUsize>,
}

impl AdmissionController {
    /// Pool of `max_concurrent` slots with the standard wait window.
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_max_wait(max_concurrent, ADMISSION_WAIT)
    }

    pub fn with_max_wait(max_concurrent: usize, max_wait: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            max_wait,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a slot, waiting at most the configured window.
    pub async fn acquire(&self) -> Result<SlotPermit, AdmissionDenied> {
        self.acquire_within(self.max_wait).await
    }

    pub async fn acquire_within(&self, max_wait: Duration) -> Result<SlotPermit, AdmissionDenied> {
        let permit = match tokio::time::timeout(max_wait, self.slots.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => permit,
            // Elapsed, or the semaphore was closed (never happens; treated alike).
            _ => {
                tracing::warn!(
                    max_concurrent = self.max_concurrent,
                    waited_ms = max_wait.as_millis() as u64,
                    "Admission denied"
                );
                return Err(AdmissionDenied { waited: max_wait });
            }
        };

        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(SlotPermit {
            active: Arc::clone(&self.active),
            _permit: permit,
        })
    }

    /// Jobs currently holding a slot.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

/// A granted slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct SlotPermit {
    active: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the counter
        // never lags behind a re-granted slot.
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let controller = AdmissionController::new(2);
        assert_eq!(controller.available(), 2);
        assert_eq!(controller.active(), 0);

        let first = controller.acquire().await.unwrap();
        let second = controller.acquire().await.unwrap();
        assert_eq!(controller.available(), 0);
        assert_eq!(controller.active(), 2);

        drop(first);
        assert_eq!(controller.available(), 1);
        assert_eq!(controller.active(), 1);

        drop(second);
        assert_eq!(controller.available(), 2);
        assert_eq!(controller.active(), 0);
    }

    #[tokio::test]
    async fn test_denied_when_pool_exhausted() {
        let controller = AdmissionController::with_max_wait(1, Duration::from_millis(20));
        let _held = controller.acquire().await.unwrap();

        let denied = controller.acquire().await.unwrap_err();
        assert_eq!(denied.waited, Duration::from_millis(20));
        assert_eq!(JobError::from(denied), JobError::ServerBusy);
        assert_eq!(controller.active(), 1);
        assert_eq!(controller.available(), 0);
    }

    #[tokio::test]
    async fn test_waiter_granted_when_slot_frees_in_window() {
        let controller = Arc::new(AdmissionController::with_max_wait(
            1,
            Duration::from_secs(2),
        ));
        let held = controller.acquire().await.unwrap();

        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
        assert_eq!(controller.active(), 0);
        assert_eq!(controller.available(), 1);
    }

    #[test]
    fn test_default_wait_window() {
        let controller = AdmissionController::new(5);
        assert_eq!(controller.max_wait(), Duration::from_secs(5));
        assert_eq!(controller.max_concurrent(), 5);
    }
}
