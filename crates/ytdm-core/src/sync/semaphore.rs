//! Resizable semaphore gating concurrent downloads.
//!
//! Unlike `tokio::sync::Semaphore`, capacity can be raised or lowered while
//! waiters are queued: raising it grants queued waiters immediately (FIFO),
//! lowering it never revokes permits already held; the count drains back
//! under the new limit as permits are released.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AcquireError {
    /// The semaphore was disposed before or while waiting.
    #[error("semaphore disposed")]
    Disposed,
    /// The supplied cancellation token fired before a permit was granted.
    #[error("acquire canceled")]
    Canceled,
}

struct Waiter {
    id: u64,
    grant: oneshot::Sender<()>,
}

struct Inner {
    count: usize,
    max_count: usize,
    disposed: bool,
    next_waiter_id: u64,
    waiters: VecDeque<Waiter>,
}

/// Semaphore with runtime-adjustable capacity and FIFO waiters.
///
/// All state transitions happen under one mutex; the grant loop in
/// [`Inner::refresh`] is the only place the count is incremented.
pub struct ResizableSemaphore {
    inner: Mutex<Inner>,
}

impl Inner {
    /// Grants queued waiters while capacity allows. A waiter whose receiver
    /// was dropped (canceled or abandoned) is discarded without taking a slot.
    fn refresh(&mut self) {
        while self.count < self.max_count {
            let Some(waiter) = self.waiters.pop_front() else {
                break;
            };
            if waiter.grant.send(()).is_ok() {
                self.count += 1;
            }
        }
    }
}

impl ResizableSemaphore {
    pub fn new(max_count: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                count: 0,
                max_count: max_count.max(1),
                disposed: false,
                next_waiter_id: 0,
                waiters: VecDeque::new(),
            }),
        })
    }

    /// Permits currently granted. May transiently exceed `max_count` right
    /// after a capacity decrease.
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().count
    }

    pub fn max_count(&self) -> usize {
        self.inner.lock().unwrap().max_count
    }

    /// Adjusts capacity. Growth may grant any number of queued waiters in one
    /// step (FIFO order among them); shrinking never revokes granted permits.
    pub fn set_capacity(&self, max_count: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.max_count = max_count.max(1);
        inner.refresh();
    }

    /// Waits for a permit. Returns an RAII [`Permit`] that releases on drop.
    ///
    /// Cancellation while queued removes the waiter without ever counting it;
    /// if cancellation races with a grant, the permit is handed straight back.
    pub async fn acquire(
        self: &Arc<Self>,
        cancel: &CancellationToken,
    ) -> Result<Permit, AcquireError> {
        let (tx, rx) = oneshot::channel();

        let waiter_id = {
            let mut inner = self.inner.lock().unwrap();
            if inner.disposed {
                return Err(AcquireError::Disposed);
            }
            let id = inner.next_waiter_id;
            inner.next_waiter_id += 1;
            inner.waiters.push_back(Waiter { id, grant: tx });
            inner.refresh();
            id
        };

        tokio::select! {
            biased;
            granted = rx => match granted {
                Ok(()) => Ok(Permit {
                    semaphore: Arc::clone(self),
                }),
                // Sender dropped without granting: the semaphore was disposed.
                Err(_) => Err(AcquireError::Disposed),
            },
            _ = cancel.cancelled() => {
                self.abandon(waiter_id);
                Err(AcquireError::Canceled)
            }
        }
    }

    /// Removes a canceled waiter. If it was granted in the meantime, the slot
    /// is released again so the count stays consistent.
    fn abandon(&self, waiter_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pos) = inner.waiters.iter().position(|w| w.id == waiter_id) {
            inner.waiters.remove(pos);
        } else if !inner.disposed {
            inner.count = inner.count.saturating_sub(1);
            inner.refresh();
        }
    }

    fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.count = inner.count.saturating_sub(1);
        if !inner.disposed {
            inner.refresh();
        }
    }

    /// Fails all pending waiters and rejects future acquisitions. Permits
    /// already granted stay valid until dropped.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disposed = true;
        // Dropping the senders wakes every waiter with a disposal error.
        inner.waiters.clear();
    }
}

/// A granted unit of concurrency capacity. Dropping it releases the slot and
/// lets the semaphore grant the next eligible waiter(s).
pub struct Permit {
    semaphore: Arc<ResizableSemaphore>,
}

impl std::fmt::Debug for Permit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit").finish_non_exhaustive()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn grants_up_to_capacity() {
        let sem = ResizableSemaphore::new(2);
        let _a = sem.acquire(&token()).await.unwrap();
        let _b = sem.acquire(&token()).await.unwrap();
        assert_eq!(sem.count(), 2);

        let pending = timeout(Duration::from_millis(50), sem.acquire(&token())).await;
        assert!(pending.is_err(), "third acquire must block");
        assert_eq!(sem.count(), 2);
    }

    #[tokio::test]
    async fn second_waiter_blocks_until_release() {
        let sem = ResizableSemaphore::new(1);
        let first = sem.acquire(&token()).await.unwrap();

        let sem2 = Arc::clone(&sem);
        let waiter = tokio::spawn(async move { sem2.acquire(&token()).await });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        let permit = timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(permit.is_ok());
        assert_eq!(sem.count(), 1);
    }

    #[tokio::test]
    async fn canceled_waiter_never_increments_count() {
        let sem = ResizableSemaphore::new(1);
        let held = sem.acquire(&token()).await.unwrap();

        let cancel = token();
        let sem2 = Arc::clone(&sem);
        let cancel2 = cancel.clone();
        let waiter = tokio::spawn(async move { sem2.acquire(&cancel2).await });
        tokio::task::yield_now().await;

        cancel.cancel();
        let res = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(res.unwrap_err(), AcquireError::Canceled);
        assert_eq!(sem.count(), 1);

        // The canceled waiter must not absorb the released slot.
        drop(held);
        assert_eq!(sem.count(), 0);
        let _p = sem.acquire(&token()).await.unwrap();
    }

    #[tokio::test]
    async fn capacity_increase_grants_queued_waiters_in_fifo_order() {
        let sem = ResizableSemaphore::new(1);
        let _held = sem.acquire(&token()).await.unwrap();

        let (order_tx, mut order_rx) = tokio::sync::mpsc::unbounded_channel();
        for tag in [1u8, 2] {
            let sem2 = Arc::clone(&sem);
            let tx = order_tx.clone();
            tokio::spawn(async move {
                let permit = sem2.acquire(&token()).await.unwrap();
                tx.send(tag).unwrap();
                // Hold the permit so the count stays observable.
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(permit);
            });
            // Ensure deterministic enqueue order.
            tokio::task::yield_now().await;
        }

        sem.set_capacity(3);
        let first = timeout(Duration::from_secs(1), order_rx.recv()).await.unwrap();
        let second = timeout(Duration::from_secs(1), order_rx.recv()).await.unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
        assert_eq!(sem.count(), 3);
    }

    #[tokio::test]
    async fn capacity_decrease_never_revokes() {
        let sem = ResizableSemaphore::new(2);
        let a = sem.acquire(&token()).await.unwrap();
        let _b = sem.acquire(&token()).await.unwrap();

        sem.set_capacity(1);
        assert_eq!(sem.count(), 2, "granted permits survive a shrink");

        drop(a);
        assert_eq!(sem.count(), 1);
        // At the new capacity, no further permit is available.
        let pending = timeout(Duration::from_millis(50), sem.acquire(&token())).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn dispose_rejects_acquire_and_wakes_waiters() {
        let sem = ResizableSemaphore::new(1);
        let _held = sem.acquire(&token()).await.unwrap();

        let sem2 = Arc::clone(&sem);
        let waiter = tokio::spawn(async move { sem2.acquire(&token()).await });
        tokio::task::yield_now().await;

        sem.dispose();
        let res = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(res.unwrap_err(), AcquireError::Disposed);

        let direct = sem.acquire(&token()).await;
        assert_eq!(direct.unwrap_err(), AcquireError::Disposed);
    }
}
