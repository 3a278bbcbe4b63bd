//! Database - the capability-typed entry point application code depends on.
//!
//! Call sites name only the [`Database`] trait and the capability traits of
//! the values they handle; the concrete store stays behind [`LocalDatabase`].
//!
//! ## Example
//!
//! ```ignore
//! use record_store::{Database, DataStore, LocalDatabase, StoreConfig};
//!
//! let db = LocalDatabase::new(DataStore::in_memory(StoreConfig::in_memory()));
//! db.write(&user, "u-1")?;
//! let loaded: User = db.read("u-1")?;
//! let live = db.objects::<User>();
//! ```

mod capability;
mod logging;

use crate::adapter::DataStore;
use crate::error::{ReadError, WriteError};
use crate::observe::Subscription;
use crate::query::Query;
use crate::store::Store;

pub use capability::{DatabaseDeletable, DatabaseObservable, DatabaseReadable, DatabaseWritable};
pub use logging::LoggingDatabase;

pub trait Database {
    /// Live snapshots of every stored value of `T`.
    fn objects<T: DatabaseObservable>(&self) -> Subscription<T> {
        self.objects_matching(Query::all())
    }

    /// Live snapshots of the values of `T` matching `query`.
    fn objects_matching<T: DatabaseObservable>(&self, query: Query<T::Record>) -> Subscription<T>;

    /// Read one value. Absence is `ReadError::NotFound`.
    fn read<T: DatabaseReadable>(&self, id: &str) -> Result<T, ReadError>;

    fn write<T: DatabaseWritable>(&self, value: &T, id: &str) -> Result<(), WriteError>;

    /// Remove one value. `Ok(false)` when nothing was stored under `id`.
    fn delete<T: DatabaseDeletable>(&self, id: &str) -> Result<bool, WriteError>;

    /// Write-then-read consistency: a successful write is immediately readable
    /// and reads back equal.
    fn write_read<T>(&self, value: &T, id: &str) -> bool
    where
        T: DatabaseReadable + DatabaseWritable + PartialEq,
    {
        if self.write(value, id).is_err() {
            return false;
        }
        matches!(self.read::<T>(id), Ok(found) if found == *value)
    }
}

/// A [`Database`] backed by a local [`DataStore`].
pub struct LocalDatabase<S> {
    data: DataStore<S>,
}

impl<S> Clone for LocalDatabase<S> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<S: Store> LocalDatabase<S> {
    pub fn new(data: DataStore<S>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &DataStore<S> {
        &self.data
    }
}

impl<S: Store> Database for LocalDatabase<S> {
    fn objects_matching<T: DatabaseObservable>(&self, query: Query<T::Record>) -> Subscription<T> {
        T::objects(&self.data, query)
    }

    fn read<T: DatabaseReadable>(&self, id: &str) -> Result<T, ReadError> {
        if !T::can_read(&self.data) {
            return Err(ReadError::NotReadable);
        }
        T::read(&self.data, id)?.ok_or_else(|| ReadError::NotFound {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    fn write<T: DatabaseWritable>(&self, value: &T, id: &str) -> Result<(), WriteError> {
        value.write(&self.data, id)
    }

    fn delete<T: DatabaseDeletable>(&self, id: &str) -> Result<bool, WriteError> {
        T::delete(&self.data, id)
    }
}
