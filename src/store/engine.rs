//! Engine - the shared transactional core behind the reference stores.
//!
//! # Threading model
//!
//! Two independent locks are used:
//!   - `state` - committed collections (`std::sync::RwLock`). A write
//!     transaction holds the write half for its whole body, so there is at
//!     most one writer and readers never see staged data.
//!   - `watchers` - registered change listeners (`parking_lot::Mutex`),
//!     snapshotted before any callback runs.
//!
//! Notifications are serialized by `notify`, which a committer takes before
//! releasing `state`, so listeners see commits in commit order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use parking_lot::{Mutex, ReentrantMutex};

use crate::config::StoreConfig;
use crate::error::StoreError;

use super::{Change, ChangeListener, ReadTxn, WatchToken, WriteTxn};

pub(crate) type Table = BTreeMap<String, Vec<u8>>;
pub(crate) type Collections = BTreeMap<String, Table>;

/// Durable backing for an engine. Loaded once on open, saved on every commit.
pub(crate) trait Persist: Send + Sync {
    fn load(&self) -> Result<Collections, StoreError>;
    fn save(&self, collections: &Collections) -> Result<(), StoreError>;
}

struct State {
    open: bool,
    loaded: bool,
    collections: Collections,
}

struct Watcher {
    token: WatchToken,
    collection: String,
    listener: ChangeListener,
}

pub(crate) struct Engine {
    config: StoreConfig,
    persist: Option<Box<dyn Persist>>,
    state: RwLock<State>,
    watchers: Mutex<Vec<Watcher>>,
    notify: ReentrantMutex<()>,
    next_token: AtomicU64,
}

impl Engine {
    pub fn new(config: StoreConfig, persist: Option<Box<dyn Persist>>) -> Self {
        Self {
            config,
            persist,
            state: RwLock::new(State {
                open: true,
                loaded: false,
                collections: Collections::new(),
            }),
            watchers: Mutex::new(Vec::new()),
            notify: ReentrantMutex::new(()),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn open(&self) -> Result<(), StoreError> {
        {
            let state = self
                .state
                .read()
                .map_err(|_| StoreError::LockPoisoned("open"))?;
            if !state.open {
                return Err(StoreError::Closed);
            }
            if state.loaded {
                return Ok(());
            }
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("open"))?;
        self.ensure_loaded(&mut state)
    }

    fn ensure_loaded(&self, state: &mut State) -> Result<(), StoreError> {
        if !state.open {
            return Err(StoreError::Closed);
        }
        if state.loaded {
            return Ok(());
        }
        if let Some(persist) = &self.persist {
            state.collections = persist.load()?;
        }
        state.loaded = true;
        Ok(())
    }

    pub fn read<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T, StoreError>,
    {
        self.open()?;
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        // Closed between open() and taking the lock.
        if !state.open || !state.loaded {
            return Err(StoreError::Closed);
        }

        let txn = Committed {
            config: &self.config,
            collections: &state.collections,
        };
        body(&txn)
    }

    pub fn write<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T, StoreError>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        self.ensure_loaded(&mut state)?;

        let mut staged = Staged {
            config: &self.config,
            base: &state.collections,
            pending: BTreeMap::new(),
        };
        let value = body(&mut staged)?;
        let pending = staged.pending;
        if pending.is_empty() {
            return Ok(value);
        }

        let (undo, changes) = apply(&mut state.collections, pending);
        if let Some(persist) = &self.persist {
            if let Err(err) = persist.save(&state.collections) {
                rollback(&mut state.collections, undo);
                tracing::warn!(error = %err, "commit not persisted, rolled back");
                return Err(err);
            }
        }

        let _order = self.notify.lock();
        drop(state);
        self.notify_watchers(&changes);
        Ok(value)
    }

    pub fn watch(&self, collection: &str, listener: ChangeListener) -> Result<WatchToken, StoreError> {
        self.open()?;
        if !self.config.accepts(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }

        let token = WatchToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.watchers.lock().push(Watcher {
            token,
            collection: collection.to_string(),
            listener,
        });
        tracing::debug!(collection, ?token, "watch registered");
        Ok(token)
    }

    /// Does nothing if `token` is not present (safe to call multiple times).
    pub fn invalidate(&self, token: WatchToken) -> bool {
        let mut watchers = self.watchers.lock();
        let before = watchers.len();
        watchers.retain(|w| w.token != token);
        let removed = watchers.len() != before;
        if removed {
            tracing::debug!(?token, "watch invalidated");
        }
        removed
    }

    pub fn watch_count(&self) -> usize {
        self.watchers.lock().len()
    }

    pub fn close(&self) {
        // A poisoned lock still holds valid data; closing must not be skipped.
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.open = false;
        if self.persist.is_some() {
            state.loaded = false;
            state.collections.clear();
        }
        tracing::debug!("store closed");
    }

    fn notify_watchers(&self, changes: &[Change]) {
        for change in changes {
            // Snapshot under the lock; callbacks run without it.
            let listeners: Vec<ChangeListener> = self
                .watchers
                .lock()
                .iter()
                .filter(|w| w.collection == change.collection)
                .map(|w| w.listener.clone())
                .collect();
            for listener in listeners {
                listener(change);
            }
        }
    }
}

fn check_collection(config: &StoreConfig, collection: &str) -> Result<(), StoreError> {
    if config.accepts(collection) {
        Ok(())
    } else {
        Err(StoreError::UnknownCollection(collection.to_string()))
    }
}

/// Read view over committed state.
struct Committed<'a> {
    config: &'a StoreConfig,
    collections: &'a Collections,
}

impl ReadTxn for Committed<'_> {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_collection(self.config, collection)?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn enumerate(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        check_collection(self.config, collection)?;
        Ok(self
            .collections
            .get(collection)
            .map(|table| {
                table
                    .iter()
                    .map(|(id, bytes)| (id.clone(), bytes.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

type PendingKey = (String, String);

/// Write view: committed state overlaid with this transaction's pending writes.
struct Staged<'a> {
    config: &'a StoreConfig,
    base: &'a Collections,
    pending: BTreeMap<PendingKey, Option<Vec<u8>>>,
}

impl ReadTxn for Staged<'_> {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_collection(self.config, collection)?;
        if let Some(pending) = self.pending.get(&(collection.to_string(), id.to_string())) {
            return Ok(pending.clone());
        }
        Ok(self
            .base
            .get(collection)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn enumerate(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        check_collection(self.config, collection)?;
        let mut table = self.base.get(collection).cloned().unwrap_or_default();
        for ((coll, id), bytes) in &self.pending {
            if coll != collection {
                continue;
            }
            match bytes {
                Some(bytes) => {
                    table.insert(id.clone(), bytes.clone());
                }
                None => {
                    table.remove(id);
                }
            }
        }
        Ok(table.into_iter().collect())
    }
}

impl WriteTxn for Staged<'_> {
    fn put(&mut self, collection: &str, id: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        check_collection(self.config, collection)?;
        self.pending
            .insert((collection.to_string(), id.to_string()), Some(bytes));
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<bool, StoreError> {
        if self.get(collection, id)?.is_none() {
            return Ok(false);
        }
        self.pending
            .insert((collection.to_string(), id.to_string()), None);
        Ok(true)
    }
}

struct Undo {
    collection: String,
    id: String,
    previous: Option<Vec<u8>>,
}

fn apply(
    collections: &mut Collections,
    pending: BTreeMap<PendingKey, Option<Vec<u8>>>,
) -> (Vec<Undo>, Vec<Change>) {
    let mut undo = Vec::with_capacity(pending.len());
    let mut changes: BTreeMap<String, Change> = BTreeMap::new();

    for ((collection, id), bytes) in pending {
        let table = collections.entry(collection.clone()).or_default();
        let is_put = bytes.is_some();
        let previous = match bytes {
            Some(bytes) => table.insert(id.clone(), bytes),
            None => table.remove(&id),
        };

        let change = changes
            .entry(collection.clone())
            .or_insert_with(|| Change::new(collection.clone()));
        match (is_put, previous.is_some()) {
            (true, false) => change.inserted.push(id.clone()),
            (true, true) => change.updated.push(id.clone()),
            (false, true) => change.deleted.push(id.clone()),
            (false, false) => {}
        }

        undo.push(Undo {
            collection,
            id,
            previous,
        });
    }

    let changes = changes.into_values().filter(|c| !c.is_empty()).collect();
    (undo, changes)
}

fn rollback(collections: &mut Collections, undo: Vec<Undo>) {
    for entry in undo.into_iter().rev() {
        let table = collections.entry(entry.collection).or_default();
        match entry.previous {
            Some(bytes) => {
                table.insert(entry.id, bytes);
            }
            None => {
                table.remove(&entry.id);
            }
        }
    }
}
