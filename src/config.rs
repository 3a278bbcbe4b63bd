//! Store configuration.
//!
//! A `StoreConfig` is built explicitly and handed to a store constructor;
//! there is no process-wide default store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Persistable;

/// What a live subscription does when the store fails underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserveErrorPolicy {
    /// Emit an empty snapshot in place of a failed re-query and keep watching.
    ///
    /// If the store cannot be watched when the subscription starts, the empty
    /// snapshot is the only item and the subscription then ends.
    #[default]
    EmitEmpty,
    /// Deliver the error as a terminal item and end the subscription.
    Propagate,
}

/// Configuration shared by the reference stores and the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file for a [`FileStore`](crate::FileStore). Ignored by the in-memory store.
    pub location: Option<PathBuf>,
    /// Schema version recorded in, and checked against, persisted snapshots.
    pub schema_version: u32,
    /// Collections the store accepts. Empty means any collection.
    pub collections: Vec<String>,
    pub on_observe_error: ObserveErrorPolicy,
    /// Panic on a stored record that fails to decode instead of only reporting it.
    pub strict_integrity: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: None,
            schema_version: 1,
            collections: Vec::new(),
            on_observe_error: ObserveErrorPolicy::default(),
            strict_integrity: cfg!(debug_assertions),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let bytes = fs::read(path.as_ref())?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Encoding(e.to_string()))
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Register the collection of a record type.
    pub fn register<R: Persistable>(mut self) -> Self {
        if !self.collections.iter().any(|c| c == R::COLLECTION) {
            self.collections.push(R::COLLECTION.to_string());
        }
        self
    }

    pub fn on_observe_error(mut self, policy: ObserveErrorPolicy) -> Self {
        self.on_observe_error = policy;
        self
    }

    pub fn strict_integrity(mut self, strict: bool) -> Self {
        self.strict_integrity = strict;
        self
    }

    /// Whether `collection` may be stored under this configuration.
    pub fn accepts(&self, collection: &str) -> bool {
        self.collections.is_empty() || self.collections.iter().any(|c| c == collection)
    }
}
