//! Thin facade over an embedded ordered key-value engine (RocksDB).
//!
//! Every operation here is blocking disk I/O; callers on the network thread
//! must offload through `tokio::task::spawn_blocking` (see `engine.rs`).

use std::path::{Path, PathBuf};

use rust_rocksdb::{IteratorMode, WriteBatch, DB};

#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store unavailable: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<rust_rocksdb::Error> for StoreError {
    fn from(err: rust_rocksdb::Error) -> Self {
        StoreError(err.to_string())
    }
}

pub struct Store {
    db: DB,
    path: PathBuf,
}

impl Store {
    /// Creates the directory if absent, opens or creates the database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)
            .map_err(|e| StoreError(format!("failed to create db directory: {e}")))?;

        let mut opts = rust_rocksdb::Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, &path)?;
        Ok(Self { db, path })
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.put(key, value)?;
        Ok(())
    }

    /// Idempotent: deleting an absent key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.delete(key)?;
        Ok(())
    }

    /// Walks keys in ascending byte order starting at the first key >=
    /// `prefix`, stopping at the first key that no longer starts with
    /// `prefix`, invoking `on_key` for each match as the native forward
    /// iterator advances. Never materializes the matched key set itself —
    /// callers that need bounded-memory batching (e.g. prefix delete) push
    /// into their own fixed-size batch from within `on_key`.
    pub fn scan_prefix(
        &self,
        prefix: &[u8],
        mut on_key: impl FnMut(Vec<u8>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let iter = self.db.iterator(IteratorMode::From(
            prefix,
            rust_rocksdb::Direction::Forward,
        ));
        for item in iter {
            let (key, _value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            on_key(key.to_vec())?;
        }
        Ok(())
    }

    /// Atomically deletes every key in `keys`.
    pub fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for key in keys {
            batch.delete(key);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Iterates every key in the store, tallying the count. O(n); callers
    /// are warned this is slow and offers no consistency guarantee under
    /// concurrent writes.
    pub fn count(&self) -> Result<u64, StoreError> {
        let iter = self.db.iterator(IteratorMode::Start);
        let mut count = 0u64;
        for item in iter {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Closes the handle and recursively removes its on-disk directory.
pub fn destroy(store: Store) -> Result<PathBuf, StoreError> {
    let path = store.path.clone();
    drop(store);
    std::fs::remove_dir_all(&path)
        .map_err(|e| StoreError(format!("failed to remove db directory: {e}")))?;
    Ok(path)
}
