//! DataStore - typed reads, writes, deletes and queries over any [`Store`].
//!
//! The adapter owns the store handle. It encodes records as JSON on the way
//! in, decodes (and checks) them on the way out, and converts between records
//! and models for the model-level helpers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{ReadError, StoreError, WriteError};
use crate::model::{Model, Persistable, Record};
use crate::observe::{self, Subscription};
use crate::query::{Query, Row};
use crate::store::{FileStore, InMemoryStore, Store};

pub struct DataStore<S> {
    store: Arc<S>,
    config: StoreConfig,
}

impl<S> Clone for DataStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl DataStore<InMemoryStore> {
    /// An adapter over a fresh in-memory store built from `config`.
    pub fn in_memory(config: StoreConfig) -> Self {
        Self::from_store(InMemoryStore::with_config(config))
    }
}

impl DataStore<FileStore> {
    /// An adapter over a file store at `config.location`.
    pub fn file(config: StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::from_store(FileStore::new(config)?))
    }
}

impl<S: Store> DataStore<S> {
    /// Wrap `store`, taking every setting from the store's own configuration
    /// (defaults for a store without one).
    pub fn from_store(store: S) -> Self {
        let config = store.store_config().cloned().unwrap_or_default();
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Wrap `store` with explicit adapter settings.
    ///
    /// The adapter itself only reads `on_observe_error` and
    /// `strict_integrity` from `config`. Location, schema version and
    /// collection registration belong to the store: when the store carries a
    /// configuration, those fields are taken from it and the ones passed here
    /// are ignored.
    pub fn new(store: S, config: StoreConfig) -> Self {
        let config = match store.store_config() {
            Some(own) => {
                if own.collections != config.collections {
                    tracing::warn!(
                        store = ?own.collections,
                        ignored = ?config.collections,
                        "collection registration comes from the store"
                    );
                }
                StoreConfig {
                    on_observe_error: config.on_observe_error,
                    strict_integrity: config.strict_integrity,
                    ..own.clone()
                }
            }
            None => config,
        };
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the store can currently be opened. Never fails.
    pub fn can_read(&self) -> bool {
        match self.store.open() {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "store cannot be opened");
                false
            }
        }
    }

    /// Look up one record. `Ok(None)` when the id does not exist.
    pub fn read<R: Persistable>(&self, id: &str) -> Result<Option<R>, ReadError> {
        let bytes = self
            .store
            .read(|txn| txn.get(R::COLLECTION, id))
            .map_err(|err| read_failure(R::COLLECTION, err))?;

        bytes.map(|bytes| self.decode::<R>(id, &bytes)).transpose()
    }

    /// Upsert a record in a single write transaction.
    pub fn try_write<R: Persistable>(&self, record: &R) -> Result<(), WriteError> {
        let bytes = serde_json::to_vec(record).map_err(|e| WriteError::Encoding(e.to_string()))?;

        self.store
            .write(|txn| txn.put(R::COLLECTION, record.id(), bytes))
            .map_err(|err| {
                tracing::warn!(collection = R::COLLECTION, id = record.id(), error = %err, "write failed");
                WriteError::from(err)
            })
    }

    /// Upsert a record. Returns false if the transaction did not commit.
    pub fn write<R: Persistable>(&self, record: &R) -> bool {
        self.try_write(record).is_ok()
    }

    /// Remove a record. `Ok(false)` when there was nothing to remove.
    pub fn try_delete<R: Persistable>(&self, id: &str) -> Result<bool, WriteError> {
        self.store
            .write(|txn| txn.delete(R::COLLECTION, id))
            .map_err(|err| {
                tracing::warn!(collection = R::COLLECTION, id, error = %err, "delete failed");
                WriteError::from(err)
            })
    }

    /// Remove a record. Returns true only if a record was actually removed.
    pub fn delete<R: Persistable>(&self, id: &str) -> bool {
        self.try_delete::<R>(id).unwrap_or(false)
    }

    /// Run a query: filter, then sort. Zero matches is `Ok(vec![])`.
    pub fn query<R: Persistable>(&self, query: &Query<R>) -> Result<Vec<R>, ReadError> {
        let entries = self
            .store
            .read(|txn| txn.enumerate(R::COLLECTION))
            .map_err(|err| read_failure(R::COLLECTION, err))?;

        let sorted = !query.sort().is_empty();
        let rows = entries
            .into_iter()
            .map(|(id, bytes)| self.decode_row::<R>(&id, &bytes, sorted))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(query.apply(rows))
    }

    // ========================================================================
    // Model-level helpers
    // ========================================================================

    pub fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ReadError> {
        Ok(self.read::<M::Record>(id)?.map(|record| record.to_model()))
    }

    pub fn save_model<M: Model>(&self, model: &M) -> Result<(), WriteError> {
        self.try_write(&model.to_record())
    }

    pub fn delete_model<M: Model>(&self, id: &str) -> Result<bool, WriteError> {
        self.try_delete::<M::Record>(id)
    }

    pub fn query_models<M: Model>(&self, query: &Query<M::Record>) -> Result<Vec<M>, ReadError> {
        Ok(self
            .query(query)?
            .iter()
            .map(|record| record.to_model())
            .collect())
    }

    /// Start a live subscription to `query`, emitting models.
    pub fn observe<M: Model>(&self, query: Query<M::Record>) -> Subscription<M> {
        observe::spawn(self.clone(), query)
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    fn decode<R: Persistable>(&self, id: &str, bytes: &[u8]) -> Result<R, ReadError> {
        serde_json::from_slice(bytes)
            .map_err(|e| self.integrity_failure(R::COLLECTION, id, e.to_string()))
    }

    fn decode_row<R: Persistable>(
        &self,
        id: &str,
        bytes: &[u8],
        keep_value: bool,
    ) -> Result<Row<R>, ReadError> {
        if !keep_value {
            return Ok(Row {
                value: Value::Null,
                record: self.decode(id, bytes)?,
            });
        }

        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| self.integrity_failure(R::COLLECTION, id, e.to_string()))?;
        let record = R::deserialize(&value)
            .map_err(|e| self.integrity_failure(R::COLLECTION, id, e.to_string()))?;
        Ok(Row { value, record })
    }

    fn integrity_failure(&self, collection: &str, id: &str, reason: String) -> ReadError {
        tracing::error!(collection, id, %reason, "stored record failed to decode");
        if self.config.strict_integrity {
            panic!(
                "stored {} record {} failed to decode: {}",
                collection, id, reason
            );
        }
        ReadError::Integrity {
            collection: collection.to_string(),
            id: id.to_string(),
            reason,
        }
    }
}

fn read_failure(collection: &str, err: StoreError) -> ReadError {
    tracing::warn!(collection, error = %err, "read failed");
    ReadError::from(err)
}
