//! Worker pool
//!
//! Bounds how many jobs execute concurrently, decoupling the polling
//! cadence from execution duration. The pool is a counting semaphore:
//! dispatch takes a permit before a job is claimed and the permit travels
//! with the job task, so the number of live child processes can never
//! exceed the configured capacity no matter how deep the queue is.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity execution slots.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free execution slot.
    ///
    /// Submission queues here when the pool is saturated; the permit is
    /// released by dropping it when the job task finishes.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("worker pool semaphore is never closed")
    }

    /// Takes a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn capacity_bounds_simultaneous_permits() {
        let pool = WorkerPool::new(2);

        let first = pool.try_acquire().expect("first slot");
        let _second = pool.try_acquire().expect("second slot");

        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
        assert!(pool.try_acquire().is_some());
    }

    #[tokio::test]
    async fn acquire_waits_for_a_released_slot() {
        let pool = WorkerPool::new(1);
        let held = pool.acquire().await;

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move {
                pool.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should unblock once the slot frees")
            .unwrap();
    }
}
