//! Minimum spacing between successive calls to a rate-limited endpoint.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The throttled wait was canceled before a grant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("throttled wait canceled")]
pub struct WaitCanceled;

/// Serializes callers and enforces a minimum interval between grants.
///
/// Two consecutive returns from [`ThrottleLock::wait`] are never closer than
/// `interval`. Cancellation during the wait aborts that caller without
/// recording a new timestamp, so the next caller is not penalized.
pub struct ThrottleLock {
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl ThrottleLock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(None),
        }
    }

    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), WaitCanceled> {
        if cancel.is_cancelled() {
            return Err(WaitCanceled);
        }
        let mut last_grant = tokio::select! {
            guard = self.last_grant.lock() => guard,
            _ = cancel.cancelled() => return Err(WaitCanceled),
        };

        if let Some(last) = *last_grant {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval - elapsed) => {}
                    _ = cancel.cancelled() => return Err(WaitCanceled),
                }
            }
        }

        *last_grant = Some(Instant::now());
        Ok(())
    }
}
