#![allow(dead_code)]

pub mod users;

use std::time::Duration;

use record_store::{DataStore, InMemoryStore, LocalDatabase, StoreConfig};

/// Upper bound for waiting on a subscription emission.
pub const WAIT: Duration = Duration::from_secs(5);

/// Window in which an emission is expected NOT to arrive.
pub const QUIET: Duration = Duration::from_millis(200);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn memory_db() -> LocalDatabase<InMemoryStore> {
    memory_db_with(StoreConfig::in_memory())
}

pub fn memory_db_with(config: StoreConfig) -> LocalDatabase<InMemoryStore> {
    init_tracing();
    LocalDatabase::new(DataStore::in_memory(config))
}
