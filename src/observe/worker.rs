//! Background worker that keeps a subscription's snapshots current.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::adapter::DataStore;
use crate::config::ObserveErrorPolicy;
use crate::error::ReadError;
use crate::model::{Model, Persistable};
use crate::query::Query;
use crate::store::{Change, ChangeListener, Store};

use super::{Emission, Mailbox, Signal, Subscription};

/// Marks the mailbox finished when the worker exits, however it exits.
struct Outbox<T>(Arc<Mailbox<T>>);

impl<T> Outbox<T> {
    fn post(&self, item: Emission<T>) -> bool {
        self.0.post(item)
    }
}

impl<T> Drop for Outbox<T> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Register a watch for `M`'s collection and start the worker thread.
///
/// The watch is registered before the initial snapshot is taken, so a commit
/// racing with subscription start is never missed (at worst it is emitted twice).
pub(crate) fn spawn<S, M>(data: DataStore<S>, query: Query<M::Record>) -> Subscription<M>
where
    S: Store,
    M: Model,
{
    let collection = <M::Record as Persistable>::COLLECTION;
    let policy = data.config().on_observe_error;
    let mailbox = Arc::new(Mailbox::new());
    let outbox = Outbox(Arc::clone(&mailbox));
    let (wake_tx, wake_rx) = channel::<Signal>();

    let notifier = Mutex::new(wake_tx.clone());
    let listener: ChangeListener = Arc::new(move |_: &Change| {
        // Receiver gone means the worker already exited.
        let _ = notifier.lock().send(Signal::Changed);
    });

    let token = match data.store().watch(collection, listener) {
        Ok(token) => token,
        Err(err) => {
            tracing::warn!(collection, error = %err, "cannot watch store");
            let item = match policy {
                ObserveErrorPolicy::EmitEmpty => Ok(Vec::new()),
                ObserveErrorPolicy::Propagate => Err(ReadError::from(err)),
            };
            outbox.post(item);
            drop(outbox);
            return Subscription::new(mailbox, None, None);
        }
    };

    let watched = data.clone();
    let teardown: Box<dyn FnOnce() + Send> = Box::new(move || {
        watched.store().invalidate(token);
    });

    thread::spawn(move || {
        run(data, query, policy, wake_rx, outbox);
        tracing::debug!(collection, "subscription worker exited");
    });

    tracing::debug!(collection, ?token, "subscription started");
    Subscription::new(mailbox, Some(wake_tx), Some(teardown))
}

fn run<S, M>(
    data: DataStore<S>,
    query: Query<M::Record>,
    policy: ObserveErrorPolicy,
    wake: Receiver<Signal>,
    out: Outbox<M>,
) where
    S: Store,
    M: Model,
{
    if !emit(&data, &query, policy, &out) {
        return;
    }

    while let Ok(signal) = wake.recv() {
        match signal {
            Signal::Stop => break,
            Signal::Changed => {
                if drain(&wake) {
                    break;
                }
                if !emit(&data, &query, policy, &out) {
                    break;
                }
            }
        }
    }
}

/// Coalesce change signals that piled up while the last snapshot was built.
/// Returns true if a stop was seen.
fn drain(wake: &Receiver<Signal>) -> bool {
    loop {
        match wake.try_recv() {
            Ok(Signal::Changed) => continue,
            Ok(Signal::Stop) | Err(TryRecvError::Disconnected) => return true,
            Err(TryRecvError::Empty) => return false,
        }
    }
}

/// Compute and deliver one snapshot. Returns false when the worker should stop.
fn emit<S, M>(
    data: &DataStore<S>,
    query: &Query<M::Record>,
    policy: ObserveErrorPolicy,
    out: &Outbox<M>,
) -> bool
where
    S: Store,
    M: Model,
{
    let item = match data.query_models::<M>(query) {
        Ok(models) => Ok(models),
        Err(err) => {
            tracing::warn!(
                collection = <M::Record as Persistable>::COLLECTION,
                error = %err,
                ?policy,
                "live query failed"
            );
            match policy {
                ObserveErrorPolicy::EmitEmpty => Ok(Vec::new()),
                ObserveErrorPolicy::Propagate => Err(err),
            }
        }
    };
    let terminal = item.is_err();
    out.post(item) && !terminal
}
