//! Admission control for upstream requests.
//!
//! A [`Governor`] caps how many fetches are in flight at once and charges a
//! fixed pacing delay to every admitted call while its slot is still held.
//! Waiters are released in arrival order (tokio's semaphore is FIFO-fair).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;

/// The governor was closed. No further work can be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency governor is closed")]
pub struct GovernorClosed;

#[derive(Debug)]
pub struct Governor {
    semaphore: Arc<Semaphore>,
    delay: Duration,
}

impl Governor {
    pub fn new(limit: usize, delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            delay,
        }
    }

    /// Run `fut` once a slot is free, then hold the slot for the pacing delay.
    ///
    /// The slot is returned when the permit drops, including when the caller
    /// is cancelled mid-call.
    pub async fn admit<F: Future>(&self, fut: F) -> Result<F::Output, GovernorClosed> {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GovernorClosed)?;

        let output = fut.await;
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }
        Ok(output)
    }

    /// Refuse all current and future waiters.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
