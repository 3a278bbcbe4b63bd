//! FileStore - single-file store whose snapshot is rewritten on every commit.
//!
//! The snapshot is a short magic header followed by a `bitcode` encoding of
//! every collection plus the schema version it was written with. Each commit
//! writes a temp file in the same directory, syncs it, and renames it over the
//! previous snapshot, so a reader of the file sees either the old or the new
//! state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::StoreConfig;
use crate::error::StoreError;

use super::engine::{Collections, Engine, Persist};
use super::{ChangeListener, ReadTxn, Store, WatchToken, WriteTxn};

const MAGIC: &[u8; 4] = b"RSS1";

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    schema_version: u32,
    collections: Collections,
}

struct FilePersist {
    path: PathBuf,
    schema_version: u32,
}

impl FilePersist {
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Persist for FilePersist {
    fn load(&self) -> Result<Collections, StoreError> {
        if !self.path.exists() {
            let dir = self.directory();
            if !dir.is_dir() {
                return Err(StoreError::Unavailable(format!(
                    "directory {} does not exist",
                    dir.display()
                )));
            }
            tracing::debug!(path = %self.path.display(), "no snapshot yet, starting empty");
            return Ok(Collections::new());
        }

        let bytes = fs::read(&self.path)?;
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| StoreError::Encoding("missing snapshot header".into()))?;
        let snapshot: SnapshotFile =
            bitcode::deserialize(body).map_err(|e| StoreError::Encoding(e.to_string()))?;
        if snapshot.schema_version != self.schema_version {
            return Err(StoreError::SchemaMismatch {
                expected: self.schema_version,
                found: snapshot.schema_version,
            });
        }

        tracing::debug!(
            path = %self.path.display(),
            collections = snapshot.collections.len(),
            "snapshot loaded"
        );
        Ok(snapshot.collections)
    }

    fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let snapshot = SnapshotFile {
            schema_version: self.schema_version,
            collections: collections.clone(),
        };
        let bytes =
            bitcode::serialize(&snapshot).map_err(|e| StoreError::Encoding(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(self.directory())?;
        tmp.write_all(MAGIC)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error.to_string()))?;
        Ok(())
    }
}

/// File-backed store. Clone-friendly via Arc: clones share the open snapshot.
///
/// Opening is lazy: the snapshot is read on the first `open` or transaction,
/// and a failed load is retried on the next one.
#[derive(Clone)]
pub struct FileStore {
    engine: Arc<Engine>,
    path: PathBuf,
}

impl FileStore {
    /// Create a store for `config.location`. Fails only if no location is configured.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let path = config
            .location
            .clone()
            .ok_or_else(|| StoreError::Unavailable("no store location configured".into()))?;
        let persist = FilePersist {
            path: path.clone(),
            schema_version: config.schema_version,
        };

        Ok(Self {
            engine: Arc::new(Engine::new(config, Some(Box::new(persist)))),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        self.engine.config()
    }

    pub fn watch_count(&self) -> usize {
        self.engine.watch_count()
    }
}

impl Store for FileStore {
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
