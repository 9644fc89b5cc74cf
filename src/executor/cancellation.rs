//! Advisory cancellation of an in-flight request.

use std::{
    fmt,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use fnv::FnvHashMap;
use tokio::time::Sleep;

use crate::executor::{FieldError, FieldResult};

/// Cancellation signal shared by every field of one request.
///
/// Cancellation is advisory: the executor checks it before starting a field,
/// and stops waiting on pending fields once [`cancel()`] is called or the
/// deadline passes. Waiting on a deadline requires a Tokio runtime with its
/// time driver enabled.
///
/// Clones share the same cancel flag, while each clone may carry a tighter
/// deadline (see [`Cancellation::with_deadline()`]).
///
/// [`cancel()`]: Cancellation::cancel
#[derive(Clone, Default)]
pub struct Cancellation {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

#[derive(Default)]
struct Shared {
    cancelled: AtomicBool,
    next_waiter: AtomicU64,
    waiters: Mutex<FnvHashMap<u64, Waker>>,
}

impl Shared {
    fn waiters(&self) -> MutexGuard<'_, FnvHashMap<u64, Waker>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Cancellation {
    /// Creates a new, not yet cancelled [`Cancellation`] without deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a [`Cancellation`] sharing this one's flag, and expiring at the
    /// given `deadline` or at this one's deadline, whichever comes first.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            shared: self.shared.clone(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    /// Same as [`Cancellation::with_deadline()`], but relative to now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the deadline of this [`Cancellation`], if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels every clone of this [`Cancellation`] and wakes up all the
    /// tasks waiting on [`Cancellation::cancelled()`].
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        let waiters = std::mem::take(&mut *self.shared.waiters());
        for waker in waiters.into_values() {
            waker.wake();
        }
    }

    /// Checks whether this [`Cancellation`] was cancelled or its deadline has
    /// passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with a request-level "cancelled" [`FieldError`] if
    /// [`Cancellation::is_cancelled()`].
    pub fn check(&self) -> FieldResult<()> {
        if self.is_cancelled() {
            Err(FieldError::cancelled())
        } else {
            Ok(())
        }
    }

    /// Returns a future resolving once [`Cancellation::cancel()`] is called or
    /// the deadline passes.
    #[must_use]
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            shared: self.shared.clone(),
            waiter: None,
            deadline: self.deadline,
            sleep: None,
        }
    }

    /// Number of [`Cancelled`] futures currently registered for wake-up.
    #[cfg(test)]
    pub(crate) fn waiting(&self) -> usize {
        self.shared.waiters().len()
    }
}

impl fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellation")
            .field("cancelled", &self.shared.cancelled.load(Ordering::Relaxed))
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Future returned by [`Cancellation::cancelled()`].
///
/// Unregisters itself from its [`Cancellation`] when dropped.
#[must_use = "futures do nothing unless polled"]
pub struct Cancelled {
    shared: Arc<Shared>,
    waiter: Option<u64>,
    deadline: Option<Instant>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.shared.cancelled.load(Ordering::Acquire) {
            return Poll::Ready(());
        }

        if let Some(deadline) = this.deadline {
            // Created lazily, so that no timer is needed until first polled.
            let sleep = this.sleep.get_or_insert_with(|| {
                Box::pin(tokio::time::sleep_until(deadline.into()))
            });
            if sleep.as_mut().poll(cx).is_ready() {
                return Poll::Ready(());
            }
        }

        let mut waiters = this.shared.waiters();
        // Re-check under the lock, so a concurrent `cancel()` cannot be missed.
        if this.shared.cancelled.load(Ordering::Acquire) {
            return Poll::Ready(());
        }
        let id = *this
            .waiter
            .get_or_insert_with(|| this.shared.next_waiter.fetch_add(1, Ordering::Relaxed));
        match waiters.get_mut(&id) {
            Some(w) if w.will_wake(cx.waker()) => {}
            Some(w) => w.clone_from(cx.waker()),
            None => {
                waiters.insert(id, cx.waker().clone());
            }
        }
        Poll::Pending
    }
}

impl Drop for Cancelled {
    fn drop(&mut self) {
        if let Some(id) = self.waiter.take() {
            self.shared.waiters().remove(&id);
        }
    }
}
