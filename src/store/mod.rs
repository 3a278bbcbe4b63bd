//! Store - the minimal transactional contract the data-access layer runs on.
//!
//! Anything that can open, run scoped read/write transactions over
//! `(collection, id) -> bytes` entries, and report committed changes can back
//! a [`DataStore`](crate::DataStore). Two reference implementations ship with
//! the crate: [`InMemoryStore`] and [`FileStore`].

mod engine;
mod file;
mod in_memory;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::StoreError;

pub use file::FileStore;
pub use in_memory::InMemoryStore;

/// Read access inside a transaction. Only committed state is visible.
pub trait ReadTxn {
    /// Look up one entry. `Ok(None)` when the id is absent.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries of a collection in natural order (ascending id).
    fn enumerate(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}

/// Write access inside a transaction. Reads observe the transaction's own writes.
pub trait WriteTxn: ReadTxn {
    /// Insert or replace the entry at `id`.
    fn put(&mut self, collection: &str, id: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Remove the entry at `id`. Returns false if there was nothing to remove.
    fn delete(&mut self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

/// Identifies a registered watch so it can be invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchToken(u64);

impl WatchToken {
    pub(crate) fn new(raw: u64) -> Self {
        WatchToken(raw)
    }
}

/// The ids touched in one collection by one committed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    pub collection: String,
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl Change {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Callback invoked after each commit that touches the watched collection.
///
/// Listeners run on the committing thread and must return quickly; hand the
/// work off (e.g. over a channel) rather than reading the store inline.
pub type ChangeListener = Arc<dyn Fn(&Change) + Send + Sync>;

/// Transactional record storage.
///
/// `write` holds exclusive access for the whole body: its effects are
/// committed only when the body returns `Ok` and are discarded otherwise.
/// `read` bodies may run concurrently with each other but never observe an
/// uncommitted write.
pub trait Store: Send + Sync + 'static {
    /// Open (or verify) the underlying storage. Cheap once opened.
    fn open(&self) -> Result<(), StoreError>;

    /// Run `body` inside a read transaction.
    fn read<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T, StoreError>;

    /// Run `body` inside an all-or-nothing write transaction.
    fn write<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T, StoreError>;

    /// Register `listener` for committed changes to `collection`.
    fn watch(&self, collection: &str, listener: ChangeListener) -> Result<WatchToken, StoreError>;

    /// Remove a watch. Returns false if the token was already invalidated.
    fn invalidate(&self, token: WatchToken) -> bool;

    /// Close the store. Subsequent opens and transactions fail with `StoreError::Closed`.
    fn close(&self);

    /// The configuration the store was built from, if it has one.
    fn store_config(&self) -> Option<&StoreConfig> {
        None
    }
}
