//! The semantic layer over the Store Adapter and Entry Codec: TTL-aware
//! set/get, expire-on-read, prefix deletion, counters and lifecycle.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::codec::Entry;
use crate::duration;
use crate::store::{self, Store, StoreError};

const PREFIX_DELETE_BATCH_SIZE: usize = 1000;

#[derive(Debug, Default)]
struct Counters {
    hit: AtomicU64,
    miss: AtomicU64,
    expire: AtomicU64,
    delete: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub hit: u64,
    pub miss: u64,
    pub expire: u64,
    pub delete: u64,
    pub hit_rate: f64,
}

pub struct SetOutcome {
    pub key: String,
    pub value: serde_json::Value,
    pub expire: Option<f64>,
}

pub struct GetOutcome {
    pub value: serde_json::Value,
    pub expire: Option<f64>,
    pub duration: Option<String>,
}

/// Ties the Store Adapter and Entry Codec together. The store handle is
/// owned exclusively by this struct behind a lock that `/close` and
/// `/clear` replace in place, so every `Arc<CacheEngine>` handed to axum
/// keeps observing the same engine identity across a reset.
pub struct CacheEngine {
    db_path: PathBuf,
    store: RwLock<Option<Store>>,
    counters: Counters,
}

impl CacheEngine {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let store = Store::open(&db_path)?;
        Ok(Self {
            db_path,
            store: RwLock::new(Some(store)),
            counters: Counters::default(),
        })
    }

    fn with_store<T>(&self, f: impl FnOnce(&Store) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let guard = self.store.read().expect("store lock poisoned");
        match guard.as_ref() {
            Some(store) => f(store),
            None => Err(StoreError("store is closed".to_string())),
        }
    }

    pub fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        expire: Option<f64>,
        duration_literal: Option<String>,
    ) -> Result<SetOutcome, SetError> {
        let resolved_expire = match &duration_literal {
            Some(literal) => Some(duration::resolve(literal).map_err(|e| SetError::BadRequest(e.to_string()))?),
            None => expire,
        };

        let entry = Entry::new(value.clone(), resolved_expire, duration_literal);
        self.with_store(|store| store.put(key.as_bytes(), &entry.encode()))
            .map_err(SetError::Store)?;

        Ok(SetOutcome {
            key: key.to_string(),
            value,
            expire: resolved_expire,
        })
    }

    pub fn set_opaque(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.with_store(|store| store.put(key.as_bytes(), bytes))
    }

    pub fn get(&self, key: &str) -> Result<GetOutcome, GetError> {
        let raw = self.with_store(|store| store.get(key.as_bytes())).map_err(GetError::Store)?;

        let Some(raw) = raw else {
            self.counters.miss.fetch_add(1, Ordering::Relaxed);
            return Err(GetError::Miss);
        };

        let entry = Entry::decode(&raw).map_err(|e| GetError::Store(StoreError(e.to_string())))?;

        if entry.is_live(now()) {
            self.counters.hit.fetch_add(1, Ordering::Relaxed);
            Ok(GetOutcome {
                value: entry.value,
                expire: entry.expire,
                duration: entry.duration,
            })
        } else {
            self.counters.expire.fetch_add(1, Ordering::Relaxed);
            self.with_store(|store| store.delete(key.as_bytes()))
                .map_err(GetError::Store)?;
            Err(GetError::Expired)
        }
    }

    pub fn get_opaque(&self, key: &str) -> Result<Vec<u8>, GetError> {
        let raw = self.with_store(|store| store.get(key.as_bytes())).map_err(GetError::Store)?;
        match raw {
            Some(bytes) => {
                self.counters.hit.fetch_add(1, Ordering::Relaxed);
                Ok(bytes)
            }
            None => {
                self.counters.miss.fetch_add(1, Ordering::Relaxed);
                Err(GetError::Miss)
            }
        }
    }

    pub fn delete(&self, key: &str) -> Result<(), DeleteError> {
        let present = self
            .with_store(|store| store.get(key.as_bytes()).map(|v| v.is_some()))
            .map_err(DeleteError::Store)?;

        if !present {
            return Err(DeleteError::NotFound);
        }

        self.with_store(|store| store.delete(key.as_bytes()))
            .map_err(DeleteError::Store)?;
        self.counters.delete.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Streams matching keys straight off the store's forward iterator into
    /// a pending batch of at most `PREFIX_DELETE_BATCH_SIZE` keys, flushing
    /// as soon as the batch fills. Never holds more than one batch's worth
    /// of keys in memory, regardless of how many keys share the prefix.
    pub fn delete_prefix(&self, prefix: &str) -> Result<u64, DeletePrefixError> {
        if prefix.is_empty() {
            return Err(DeletePrefixError::BadRequest("prefix must not be empty".to_string()));
        }

        let deleted = self
            .with_store(|store| {
                let mut pending: Vec<Vec<u8>> = Vec::with_capacity(PREFIX_DELETE_BATCH_SIZE);
                let mut deleted = 0u64;
                store.scan_prefix(prefix.as_bytes(), |key| {
                    pending.push(key);
                    if pending.len() == PREFIX_DELETE_BATCH_SIZE {
                        store.batch_delete(&pending)?;
                        deleted += pending.len() as u64;
                        pending.clear();
                    }
                    Ok(())
                })?;
                if !pending.is_empty() {
                    store.batch_delete(&pending)?;
                    deleted += pending.len() as u64;
                }
                Ok(deleted)
            })
            .map_err(DeletePrefixError::Store)?;

        self.counters.delete.fetch_add(deleted, Ordering::Relaxed);
        Ok(deleted)
    }

    /// O(n): iterates every key. No locking against concurrent mutation;
    /// the returned count is a consistent-enough estimate from one pass.
    pub fn count(&self) -> Result<u64, StoreError> {
        self.with_store(Store::count)
    }

    pub fn stats(&self) -> Stats {
        let hit = self.counters.hit.load(Ordering::Relaxed);
        let miss = self.counters.miss.load(Ordering::Relaxed);
        let expire = self.counters.expire.load(Ordering::Relaxed);
        let delete = self.counters.delete.load(Ordering::Relaxed);

        let hit_rate = if hit + miss == 0 {
            0.0
        } else {
            let rate = (hit as f64 / (hit + miss) as f64) * 100.0;
            (rate * 100.0).round() / 100.0
        };

        Stats {
            hit,
            miss,
            expire,
            delete,
            hit_rate,
        }
    }

    pub fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.store.write().expect("store lock poisoned");
        *guard = None;
        Ok(())
    }

    /// Closes, recursively removes the on-disk directory, re-opens an
    /// empty store under the same path. The new `Store` is installed in
    /// place so every holder of `Arc<CacheEngine>` observes it.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut guard = self.store.write().expect("store lock poisoned");
        if let Some(store) = guard.take() {
            store::destroy(store)?;
        } else {
            std::fs::remove_dir_all(&self.db_path).ok();
        }
        let fresh = Store::open(&self.db_path)?;
        *guard = Some(fresh);
        Ok(())
    }
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug)]
pub enum SetError {
    BadRequest(String),
    Store(StoreError),
}

#[derive(Debug)]
pub enum GetError {
    Miss,
    Expired,
    Store(StoreError),
}

#[derive(Debug)]
pub enum DeleteError {
    NotFound,
    Store(StoreError),
}

#[derive(Debug)]
pub enum DeletePrefixError {
    BadRequest(String),
    Store(StoreError),
}
