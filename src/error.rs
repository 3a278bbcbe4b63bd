use thiserror::Error;

/// Failures reported by a [`Store`](crate::Store) implementation.
///
/// These never reach application code directly: the adapter collapses them
/// into [`ReadError`] / [`WriteError`] (or `false` for the boolean contract).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("schema version mismatch (expected {expected}, found {found})")]
    SchemaMismatch { expected: u32, found: u32 },
    #[error("collection {0} is not registered with this store")]
    UnknownCollection(String),
    #[error("store io error: {0}")]
    Io(String),
    #[error("store encoding error: {0}")]
    Encoding(String),
    #[error("transaction aborted: {0}")]
    Aborted(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Read-side error taxonomy.
///
/// Absence of data and failure to read are distinct: `NotFound` means the
/// store answered and had nothing, `NotReadable` means it could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("store could not be opened for reading")]
    NotReadable,
    #[error("collection {0} is not registered with this store")]
    UnknownCollection(String),
    #[error("no {collection} record with id {id}")]
    NotFound { collection: String, id: String },
    #[error("stored {collection} record {id} failed to decode: {reason}")]
    Integrity {
        collection: String,
        id: String,
        reason: String,
    },
}

impl From<StoreError> for ReadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownCollection(collection) => ReadError::UnknownCollection(collection),
            _ => ReadError::NotReadable,
        }
    }
}

/// Write-side error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("store could not be opened for writing")]
    NotWritable,
    #[error("write transaction failed: {0}")]
    Transaction(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("record id {record} does not match requested id {requested}")]
    IdMismatch { requested: String, record: String },
    #[error("failed to encode record: {0}")]
    Encoding(String),
}

impl From<StoreError> for WriteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Closed
            | StoreError::Unavailable(_)
            | StoreError::SchemaMismatch { .. } => WriteError::NotWritable,
            StoreError::UnknownCollection(collection) => {
                WriteError::Constraint(format!("unregistered collection {}", collection))
            }
            StoreError::Encoding(msg) => WriteError::Encoding(msg),
            other => WriteError::Transaction(other.to_string()),
        }
    }
}
