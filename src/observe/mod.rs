//! Live subscriptions to a query.
//!
//! Each subscription owns a background thread and a store watch. The thread
//! emits the current result set immediately, then a fresh snapshot after every
//! commit to the watched collection, until the subscription is cancelled.
//!
//! ## Example
//!
//! ```ignore
//! let mut users = data.observe::<User>(Query::all().sorted_by("name", true));
//!
//! let initial = users.recv().unwrap()?;
//! // ... another thread writes a user ...
//! let updated = users.recv().unwrap()?;
//!
//! users.cancel();
//! assert!(users.recv().is_none());
//! ```

mod worker;

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::ReadError;

pub(crate) use worker::spawn;

/// One item delivered by a subscription: a full snapshot, or a terminal error
/// under [`ObserveErrorPolicy::Propagate`](crate::ObserveErrorPolicy::Propagate).
pub type Emission<T> = Result<Vec<T>, ReadError>;

#[derive(Debug)]
pub(crate) enum Signal {
    Changed,
    Stop,
}

struct Slot<T> {
    pending: Option<Emission<T>>,
    cancelled: bool,
    finished: bool,
}

/// Single-slot handoff between a worker and its subscription.
///
/// Holds at most one undelivered emission; a newer snapshot replaces an
/// unread one, so a consumer that falls behind only ever sees the latest
/// state. Posting and cancelling share one lock, so once `cancel` has run
/// nothing more can be posted.
pub(crate) struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Mailbox<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                cancelled: false,
                finished: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Offer an emission. Returns false once the subscription is cancelled.
    pub(crate) fn post(&self, item: Emission<T>) -> bool {
        let mut slot = self.slot.lock();
        if slot.cancelled {
            return false;
        }
        if slot.pending.replace(item).is_some() {
            tracing::trace!("unread snapshot superseded");
        }
        self.ready.notify_all();
        true
    }

    /// The worker is done; pending emissions stay deliverable.
    pub(crate) fn finish(&self) {
        self.slot.lock().finished = true;
        self.ready.notify_all();
    }

    fn take(&self, deadline: Option<Instant>) -> Option<Emission<T>> {
        let mut slot = self.slot.lock();
        loop {
            if slot.cancelled {
                return None;
            }
            if let Some(item) = slot.pending.take() {
                return Some(item);
            }
            if slot.finished {
                return None;
            }
            match deadline {
                None => self.ready.wait(&mut slot),
                Some(deadline) => {
                    if self.ready.wait_until(&mut slot, deadline).timed_out() {
                        return if slot.cancelled {
                            None
                        } else {
                            slot.pending.take()
                        };
                    }
                }
            }
        }
    }

    fn try_take(&self) -> Option<Emission<T>> {
        let mut slot = self.slot.lock();
        if slot.cancelled {
            None
        } else {
            slot.pending.take()
        }
    }
}

/// Type-erased cancellation side of a [`Mailbox`].
trait Cancel: Send + Sync {
    /// Returns true only for the call that actually cancelled.
    fn cancel(&self) -> bool;
    fn is_cancelled(&self) -> bool;
}

impl<T: Send> Cancel for Mailbox<T> {
    fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.cancelled {
            return false;
        }
        slot.cancelled = true;
        slot.pending = None;
        self.ready.notify_all();
        true
    }

    fn is_cancelled(&self) -> bool {
        self.slot.lock().cancelled
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

struct Control {
    mailbox: Arc<dyn Cancel>,
    stop: Mutex<Option<Sender<Signal>>>,
    teardown: Mutex<Option<Teardown>>,
}

impl Control {
    fn cancel(&self) {
        if !self.mailbox.cancel() {
            return;
        }

        if let Some(release) = self.teardown.lock().take() {
            release();
        }
        if let Some(stop) = self.stop.lock().take() {
            // The worker may already be gone.
            let _ = stop.send(Signal::Stop);
        }
        tracing::debug!("subscription cancelled");
    }

    fn is_cancelled(&self) -> bool {
        self.mailbox.is_cancelled()
    }
}

/// A cloneable handle that cancels a subscription from another thread.
#[derive(Clone)]
pub struct CancelHandle {
    control: Arc<Control>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.control.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }
}

/// A live, cancellable sequence of query snapshots.
///
/// Iterating blocks until the next snapshot and ends after cancellation, a
/// terminal error, or the worker going away. A consumer that reads slower
/// than the store commits skips straight to the newest snapshot. Dropping the
/// subscription cancels it.
pub struct Subscription<T> {
    mailbox: Arc<Mailbox<T>>,
    control: Arc<Control>,
}

impl<T: Send + 'static> Subscription<T> {
    pub(crate) fn new(
        mailbox: Arc<Mailbox<T>>,
        stop: Option<Sender<Signal>>,
        teardown: Option<Teardown>,
    ) -> Self {
        let cancel: Arc<dyn Cancel> = mailbox.clone();
        Self {
            mailbox,
            control: Arc::new(Control {
                mailbox: cancel,
                stop: Mutex::new(stop),
                teardown: Mutex::new(teardown),
            }),
        }
    }
}

impl<T> Subscription<T> {
    /// Block until the next snapshot. `None` once the subscription has ended.
    pub fn recv(&self) -> Option<Emission<T>> {
        self.mailbox.take(None)
    }

    /// Return a pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<Emission<T>> {
        self.mailbox.try_take()
    }

    /// Wait up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Emission<T>> {
        self.mailbox.take(Some(Instant::now() + timeout))
    }

    /// Stop the subscription. Idempotent; nothing is delivered after it returns.
    pub fn cancel(&self) {
        self.control.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: Arc::clone(&self.control),
        }
    }
}

impl<T> Iterator for Subscription<T> {
    type Item = Emission<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.control.cancel();
    }
}
