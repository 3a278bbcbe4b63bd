//! Capability traits - what a type can do against a store.
//!
//! Each capability is independent: a type may be read-only, write-only, or
//! fully capable. Every [`Model`] gets all of them through blanket impls that
//! route through its record type.

use crate::adapter::DataStore;
use crate::error::{ReadError, WriteError};
use crate::model::{Model, Persistable};
use crate::observe::Subscription;
use crate::query::Query;
use crate::store::Store;

pub trait DatabaseReadable: Sized {
    /// Collection name used in error reports.
    const COLLECTION: &'static str;

    fn can_read<S: Store>(data: &DataStore<S>) -> bool;

    /// `Ok(None)` when nothing is stored under `id`.
    fn read<S: Store>(data: &DataStore<S>, id: &str) -> Result<Option<Self>, ReadError>;
}

pub trait DatabaseWritable {
    fn write<S: Store>(&self, data: &DataStore<S>, id: &str) -> Result<(), WriteError>;
}

pub trait DatabaseDeletable {
    /// `Ok(false)` when nothing was stored under `id`.
    fn delete<S: Store>(data: &DataStore<S>, id: &str) -> Result<bool, WriteError>;
}

pub trait DatabaseObservable: DatabaseReadable + Send + 'static {
    /// The record type queries are expressed over.
    type Record: Persistable;

    fn objects<S: Store>(data: &DataStore<S>, query: Query<Self::Record>) -> Subscription<Self>;
}

impl<M: Model> DatabaseReadable for M {
    const COLLECTION: &'static str = <M::Record as Persistable>::COLLECTION;

    fn can_read<S: Store>(data: &DataStore<S>) -> bool {
        data.can_read()
    }

    fn read<S: Store>(data: &DataStore<S>, id: &str) -> Result<Option<Self>, ReadError> {
        data.get_model::<M>(id)
    }
}

impl<M: Model> DatabaseWritable for M {
    fn write<S: Store>(&self, data: &DataStore<S>, id: &str) -> Result<(), WriteError> {
        let record = self.to_record();
        if record.id() != id {
            return Err(WriteError::IdMismatch {
                requested: id.to_string(),
                record: record.id().to_string(),
            });
        }
        data.try_write(&record)
    }
}

impl<M: Model> DatabaseDeletable for M {
    fn delete<S: Store>(data: &DataStore<S>, id: &str) -> Result<bool, WriteError> {
        data.delete_model::<M>(id)
    }
}

impl<M: Model> DatabaseObservable for M {
    type Record = M::Record;

    fn objects<S: Store>(data: &DataStore<S>, query: Query<M::Record>) -> Subscription<M> {
        data.observe::<M>(query)
    }
}
