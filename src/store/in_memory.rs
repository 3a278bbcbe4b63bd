//! InMemoryStore - BTreeMap-backed store for testing and ephemeral data.

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::StoreError;

use super::engine::Engine;
use super::{ChangeListener, ReadTxn, Store, WatchToken, WriteTxn};

/// In-memory store. Clone-friendly via Arc: clones share storage and watches.
#[derive(Clone)]
pub struct InMemoryStore {
    engine: Arc<Engine>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new empty store accepting any collection.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::in_memory())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            engine: Arc::new(Engine::new(config, None)),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        self.engine.config()
    }

    /// Number of live watches registered against this store.
    pub fn watch_count(&self) -> usize {
        self.engine.watch_count()
    }
}

impl Store for InMemoryStore {
    fn open(&self) -> Result<(), StoreError> {
        self.engine.open()
    }

    fn read<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T, StoreError>,
    {
        self.engine.read(body)
    }

    fn write<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T, StoreError>,
    {
        self.engine.write(body)
    }

    fn watch(&self, collection: &str, listener: ChangeListener) -> Result<WatchToken, StoreError> {
        self.engine.watch(collection, listener)
    }

    fn invalidate(&self, token: WatchToken) -> bool {
        self.engine.invalidate(token)
    }

    fn close(&self) {
        self.engine.close()
    }

    fn store_config(&self) -> Option<&StoreConfig> {
        Some(self.engine.config())
    }
}
