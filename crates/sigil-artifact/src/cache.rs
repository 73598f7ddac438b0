//! # SVG Source Cache
//!
//! An injectable in-memory cache of SVG text keyed by source (URL or path),
//! with LRU eviction and a time-to-live, optionally backed by a persistent
//! [`SideStore`].
//!
//! The side store is best-effort: every failure is logged at `warn` and
//! swallowed. Nothing in the protocol depends on a cache hit. The TTL
//! applies to side-store entries too: a lookup never returns an entry
//! older than the cache's TTL, and expired files are removed on sight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sigil_core::{artifact_hash, SigilError};

use crate::config::CacheConfig;

/// Persistent key/value storage behind the cache.
pub trait SideStore: Send + Sync {
    /// The value stored under `key`, unless it is older than `max_age`.
    fn get(&self, key: &str, max_age: Duration) -> Result<Option<String>, SigilError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SigilError>;
    /// Drop entries older than `max_age`. Returns how many were removed.
    fn prune(&self, max_age: Duration) -> Result<usize, SigilError>;
    fn clear(&self) -> Result<(), SigilError>;
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    key: String,
    stored_at_ms: u64,
    value: String,
}

/// A [`SideStore`] holding one JSON file per key, named by the key's
/// SHA-256.
#[derive(Debug, Clone)]
pub struct FsSideStore {
    root: PathBuf,
}

impl FsSideStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", artifact_hash(key.as_bytes()).to_hex()))
    }

    fn entries(&self) -> Result<Vec<PathBuf>, SigilError> {
        let dir = match std::fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage(e)),
        };
        let mut paths = Vec::new();
        for entry in dir {
            let path = entry.map_err(storage)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl SideStore for FsSideStore {
    fn get(&self, key: &str, max_age: Duration) -> Result<Option<String>, SigilError> {
        let path = self.entry_path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };
        let entry: StoredEntry = serde_json::from_str(&text).map_err(storage)?;
        if entry.key != key {
            return Ok(None);
        }
        if is_expired(entry.stored_at_ms, max_age, now_ms()) {
            std::fs::remove_file(&path).map_err(storage)?;
            tracing::debug!(key, "evicted expired side store entry");
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SigilError> {
        std::fs::create_dir_all(&self.root).map_err(storage)?;
        let entry = StoredEntry {
            key: key.to_string(),
            stored_at_ms: now_ms(),
            value: value.to_string(),
        };
        let text = serde_json::to_string(&entry).map_err(storage)?;
        std::fs::write(self.entry_path(key), text).map_err(storage)
    }

    fn prune(&self, max_age: Duration) -> Result<usize, SigilError> {
        let now = now_ms();
        let mut removed = 0;
        for path in self.entries()? {
            let stale = match std::fs::read_to_string(&path) {
                Ok(text) => serde_json::from_str::<StoredEntry>(&text)
                    .map(|e| is_expired(e.stored_at_ms, max_age, now))
                    .unwrap_or(true),
                Err(_) => true,
            };
            if stale {
                std::fs::remove_file(&path).map_err(storage)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), SigilError> {
        for path in self.entries()? {
            std::fs::remove_file(&path).map_err(storage)?;
        }
        Ok(())
    }
}

struct Entry {
    value: Arc<str>,
    inserted: Instant,
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    tick: u64,
}

/// LRU + TTL cache of SVG text.
pub struct SvgCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    ttl: Duration,
    side_store: Option<Arc<dyn SideStore>>,
}

impl std::fmt::Debug for SvgCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgCache")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("side_store", &self.side_store.is_some())
            .finish()
    }
}

impl SvgCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                tick: 0,
            }),
            max_entries: max_entries.max(1),
            ttl,
            side_store: None,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let cache = Self::new(config.max_entries, config.ttl());
        match &config.side_store_dir {
            Some(dir) => cache.with_side_store(Arc::new(FsSideStore::new(dir.clone()))),
            None => cache,
        }
    }

    pub fn with_side_store(mut self, store: Arc<dyn SideStore>) -> Self {
        self.side_store = Some(store);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached text for `key`, consulting the side store on a memory miss.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        {
            let mut inner = self.inner.lock();
            inner.tick += 1;
            let tick = inner.tick;
            let expired = match inner.entries.get_mut(key) {
                Some(entry) if entry.inserted.elapsed() < self.ttl => {
                    entry.last_used = tick;
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                inner.entries.remove(key);
            }
        }
        let store = self.side_store.as_ref()?;
        match store.get(key, self.ttl) {
            Ok(Some(text)) => {
                tracing::debug!(key, "side store hit");
                let value: Arc<str> = Arc::from(text);
                self.insert_memory(key, value.clone());
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "side store read failed");
                None
            }
        }
    }

    pub fn insert(&self, key: &str, value: &str) -> Arc<str> {
        let value: Arc<str> = Arc::from(value);
        self.insert_memory(key, value.clone());
        if let Some(store) = &self.side_store {
            if let Err(e) = store.set(key, &value) {
                tracing::warn!(key, error = %e, "side store write failed");
            }
        }
        value
    }

    /// Drop expired entries from memory and the side store.
    pub fn prune(&self) {
        let ttl = self.ttl;
        self.inner
            .lock()
            .entries
            .retain(|_, e| e.inserted.elapsed() < ttl);
        if let Some(store) = &self.side_store {
            match store.prune(ttl) {
                Ok(n) if n > 0 => tracing::debug!(removed = n, "pruned side store"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "side store prune failed"),
            }
        }
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        if let Some(store) = &self.side_store {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "side store clear failed");
            }
        }
    }

    fn insert_memory(&self, key: &str, value: Arc<str>) {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted: Instant::now(),
                last_used: tick,
            },
        );
        while inner.entries.len() > self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    inner.entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

fn storage(e: impl std::fmt::Display) -> SigilError {
    SigilError::Storage(e.to_string())
}

/// Whether an entry stored at `stored_at_ms` has outlived `max_age`. A zero
/// TTL expires everything.
fn is_expired(stored_at_ms: u64, max_age: Duration, now_ms: u64) -> bool {
    let age = now_ms.saturating_sub(stored_at_ms);
    u128::from(age) >= max_age.as_millis()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
