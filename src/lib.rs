// Lets `#[derive(Persistable)]` expansions resolve inside this crate too.
extern crate self as record_store;

mod adapter;
mod config;
mod database;
mod error;
mod model;
mod observe;
mod query;
mod store;

pub use adapter::DataStore;
pub use config::{ObserveErrorPolicy, StoreConfig};
pub use database::{
    Database, DatabaseDeletable, DatabaseObservable, DatabaseReadable, DatabaseWritable,
    LocalDatabase, LoggingDatabase,
};
pub use error::{ReadError, StoreError, WriteError};
pub use model::{Model, Persistable, Record};
pub use observe::{CancelHandle, Emission, Subscription};
pub use query::{compare_values, field_value, Predicate, Query, SortDirection, SortEntry};
pub use store::{
    Change, ChangeListener, FileStore, InMemoryStore, ReadTxn, Store, WatchToken, WriteTxn,
};

// Re-export the derive macro alongside the trait of the same name
pub use record_store_macros::Persistable;
