//! LoggingDatabase - traces every façade call of a wrapped [`Database`].

use std::any::type_name;

use crate::error::{ReadError, WriteError};
use crate::observe::Subscription;
use crate::query::Query;

use super::{Database, DatabaseDeletable, DatabaseObservable, DatabaseReadable, DatabaseWritable};

/// Wraps any [`Database`] and emits a `tracing` span and outcome event per call.
///
/// Successful calls log at `info`, failures at `warn`. Snapshot contents are
/// never logged; large collections would flood the output.
#[derive(Clone)]
pub struct LoggingDatabase<D> {
    inner: D,
}

impl<D: Database> LoggingDatabase<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Database> Database for LoggingDatabase<D> {
    fn objects_matching<T: DatabaseObservable>(&self, query: Query<T::Record>) -> Subscription<T> {
        let span = tracing::info_span!("database.objects", kind = type_name::<T>(), ?query);
        let _enter = span.enter();
        tracing::info!("subscribing");
        self.inner.objects_matching(query)
    }

    fn read<T: DatabaseReadable>(&self, id: &str) -> Result<T, ReadError> {
        let span = tracing::info_span!("database.read", kind = type_name::<T>(), id);
        let _enter = span.enter();
        let result = self.inner.read::<T>(id);
        match &result {
            Ok(_) => tracing::info!("read"),
            Err(err) => tracing::warn!(error = %err, "read failed"),
        }
        result
    }

    fn write<T: DatabaseWritable>(&self, value: &T, id: &str) -> Result<(), WriteError> {
        let span = tracing::info_span!("database.write", kind = type_name::<T>(), id);
        let _enter = span.enter();
        let result = self.inner.write(value, id);
        match &result {
            Ok(()) => tracing::info!("written"),
            Err(err) => tracing::warn!(error = %err, "write failed"),
        }
        result
    }

    fn delete<T: DatabaseDeletable>(&self, id: &str) -> Result<bool, WriteError> {
        let span = tracing::info_span!("database.delete", kind = type_name::<T>(), id);
        let _enter = span.enter();
        let result = self.inner.delete::<T>(id);
        match &result {
            Ok(deleted) => tracing::info!(deleted, "delete"),
            Err(err) => tracing::warn!(error = %err, "delete failed"),
        }
        result
    }
}
