//! File-backed cache with an in-memory index
//!
//! Every operation holds the single index lock for its whole critical
//! section, including the artifact I/O, so a caller never observes a key
//! whose artifact is missing or an artifact whose key is not indexed.

use crate::artifact::{artifact_id, artifact_path};
use crate::codec::{Codec, JsonCodec};
use crate::error::{CacheError, Result};
use crate::hooks::Hooks;
use crate::index::Index;
use crate::sweeper::Sweeper;
use crate::types::{CacheConfig, CacheStats, Entry};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// State guarded by the cache lock
struct Store<V> {
    index: Index,
    hooks: Hooks<V>,
}

/// Cache internals shared with the sweeper
pub(crate) struct Shared<V> {
    /// Directory where artifacts are stored
    dir: PathBuf,
    codec: Arc<dyn Codec<V>>,
    store: RwLock<Store<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
}

/// A key/value cache persisting each value as a file in one directory
pub struct FileCache<V> {
    shared: Arc<Shared<V>>,
    sweeper: Option<Sweeper>,
}

impl<V> FileCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a JSON-backed cache over an existing directory, without a sweeper
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_codec(dir, JsonCodec::new())
    }

    /// Create a JSON-backed cache and start sweeping expired entries every
    /// `interval`. Fails with [`CacheError::NoRuntime`] outside a tokio runtime.
    pub fn with_sweeper(dir: impl Into<PathBuf>, interval: std::time::Duration) -> Result<Self> {
        Self::with_codec_and_sweeper(dir, JsonCodec::new(), interval)
    }

    /// Create the cache directory if needed and open a cache as configured
    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)
            .await
            .map_err(|e| CacheError::storage(&config.cache_dir, e))?;

        let cache = match config.sweep_interval {
            Some(interval) => Self::with_sweeper(config.cache_dir.clone(), interval)?,
            None => Self::new(config.cache_dir.clone())?,
        };

        info!(cache_dir = ?config.cache_dir, sweep_interval = ?config.sweep_interval, "Cache initialized");
        Ok(cache)
    }
}

impl<V> FileCache<V>
where
    V: Send + Sync + 'static,
{
    /// Create a cache over an existing directory with a custom codec
    pub fn with_codec(dir: impl Into<PathBuf>, codec: impl Codec<V>) -> Result<Self> {
        let dir = dir.into();
        check_dir(&dir)?;

        Ok(Self {
            shared: Arc::new(Shared {
                dir,
                codec: Arc::new(codec),
                store: RwLock::new(Store {
                    index: Index::new(),
                    hooks: Hooks::default(),
                }),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                expired_evictions: AtomicU64::new(0),
            }),
            sweeper: None,
        })
    }

    /// Like [`FileCache::with_codec`], also starting the sweeper.
    /// A zero interval leaves the sweeper off.
    pub fn with_codec_and_sweeper(
        dir: impl Into<PathBuf>,
        codec: impl Codec<V>,
        interval: std::time::Duration,
    ) -> Result<Self> {
        let mut cache = Self::with_codec(dir, codec)?;
        if interval.is_zero() {
            warn!("Sweep interval is zero, sweeper disabled");
        } else {
            cache.sweeper = Some(Sweeper::start(Arc::downgrade(&cache.shared), interval)?);
        }
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.shared.dir
    }

    /// Store `value` under `key`, superseding any existing entry
    pub async fn set(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let bytes = self.shared.codec.encode(value)?;

        let mut store = self.shared.store.write().await;
        if let Some(previous) = store.index.lookup(key).cloned() {
            self.shared.remove_artifact(&previous.artifact_id).await?;
            store.index.remove(key);
        }

        let entry = self.shared.write_artifact(key, &bytes, ttl).await?;
        store.index.put(key.to_string(), entry);
        (store.hooks.on_set)(key, value);

        Ok(())
    }

    /// Fetch the value for `key`.
    ///
    /// Every failure is a miss: absent key, expired entry (reclaimed without
    /// firing any hook), unreadable artifact or undecodable bytes.
    pub async fn get(&self, key: &str) -> Option<V> {
        let stale = {
            let store = self.shared.store.read().await;
            match store.index.lookup(key) {
                None => {
                    self.shared.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                Some(entry) if entry.is_expired() => entry.clone(),
                Some(entry) => {
                    let value = self.shared.read_value(&entry.artifact_id).await;
                    return match value {
                        Ok(value) => {
                            self.shared.hits.fetch_add(1, Ordering::Relaxed);
                            debug!(key = %key, "Cache hit");
                            Some(value)
                        }
                        Err(e) => {
                            self.shared.misses.fetch_add(1, Ordering::Relaxed);
                            warn!(key = %key, error = %e, "Failed to load cached value");
                            None
                        }
                    };
                }
            }
        };

        debug!(key = %key, expires_at = %stale.expires_at, "Cache entry expired");
        self.shared.evict_stale(key, &stale).await;
        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` only if `key` is absent
    pub async fn add(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let mut store = self.shared.store.write().await;
        if store.index.has(key) {
            return Err(CacheError::AlreadyExists(key.to_string()));
        }

        let bytes = self.shared.codec.encode(value)?;
        let entry = self.shared.write_artifact(key, &bytes, ttl).await?;
        store.index.put(key.to_string(), entry);
        (store.hooks.on_add)(key, value);

        Ok(())
    }

    /// Overwrite the value of a present `key`, returning the previous value
    pub async fn replace(&self, key: &str, value: &V, ttl: Duration) -> Result<V> {
        let mut store = self.shared.store.write().await;
        let previous = store
            .index
            .lookup(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        let bytes = self.shared.codec.encode(value)?;
        let old = self.shared.read_value(&previous.artifact_id).await?;

        self.shared.remove_artifact(&previous.artifact_id).await?;
        store.index.remove(key);

        let entry = self.shared.write_artifact(key, &bytes, ttl).await?;
        store.index.put(key.to_string(), entry);
        (store.hooks.on_replace)(key, &old, value);

        Ok(old)
    }

    /// Remove `key`, returning its value
    pub async fn delete(&self, key: &str) -> Result<V> {
        let mut store = self.shared.store.write().await;
        let entry = store
            .index
            .lookup(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        let value = self.shared.read_value(&entry.artifact_id).await?;
        self.shared.remove_artifact(&entry.artifact_id).await?;
        store.index.remove(key);
        (store.hooks.on_delete)(key, &value);

        Ok(value)
    }

    /// Presence check, regardless of expiry
    pub async fn has(&self, key: &str) -> bool {
        self.shared.store.read().await.index.has(key)
    }

    /// Number of indexed keys, including expired ones not yet reclaimed
    pub async fn item_count(&self) -> usize {
        self.shared.store.read().await.index.count()
    }

    /// Remove every entry and its artifact.
    ///
    /// Stops at the first failed removal. Entries removed before the failure
    /// stay removed.
    pub async fn clear(&self) -> Result<()> {
        let mut store = self.shared.store.write().await;
        let snapshot: Vec<(String, String)> = store
            .index
            .all()
            .map(|(key, entry)| (key.clone(), entry.artifact_id.clone()))
            .collect();

        let total = snapshot.len();
        for (key, id) in snapshot {
            self.shared.remove_artifact(&id).await?;
            store.index.remove(&key);
        }

        info!(removed = total, "Cache cleared");
        Ok(())
    }

    /// Reclaim every expired entry without firing hooks, returning how many
    /// were removed
    pub async fn delete_expired(&self) -> Result<usize> {
        self.shared.delete_expired().await
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.item_count().await;
        CacheStats {
            entries,
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            expired_evictions: self.shared.expired_evictions.load(Ordering::Relaxed),
        }
    }

    pub async fn on_set<F>(&self, hook: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.shared.store.write().await.hooks.on_set = Arc::new(hook);
    }

    pub async fn on_delete<F>(&self, hook: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.shared.store.write().await.hooks.on_delete = Arc::new(hook);
    }

    pub async fn on_add<F>(&self, hook: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.shared.store.write().await.hooks.on_add = Arc::new(hook);
    }

    pub async fn on_replace<F>(&self, hook: F)
    where
        F: Fn(&str, &V, &V) + Send + Sync + 'static,
    {
        self.shared.store.write().await.hooks.on_replace = Arc::new(hook);
    }

    /// Halt the sweeper, if any. A sweep already in progress runs to completion.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    pub fn sweeper_running(&self) -> bool {
        self.sweeper.as_ref().is_some_and(Sweeper::is_running)
    }
}

impl<V> Drop for FileCache<V> {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }
}

impl<V> Shared<V>
where
    V: Send + Sync + 'static,
{
    fn path(&self, artifact_id: &str) -> PathBuf {
        artifact_path(&self.dir, artifact_id)
    }

    /// Encoded bytes go to a fresh artifact expiring `ttl` from now
    async fn write_artifact(&self, key: &str, bytes: &[u8], ttl: Duration) -> Result<Entry> {
        let expires_at = expires_after(ttl);
        let id = artifact_id(key, expires_at);
        let path = self.path(&id);

        fs::write(&path, bytes)
            .await
            .map_err(|e| CacheError::storage(&path, e))?;
        debug!(key = %key, path = ?path, size = bytes.len(), "Wrote artifact");

        Ok(Entry {
            artifact_id: id,
            expires_at,
        })
    }

    async fn read_value(&self, artifact_id: &str) -> Result<V> {
        let path = self.path(artifact_id);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| CacheError::storage(&path, e))?;
        Ok(self.codec.decode(&bytes)?)
    }

    /// An artifact that is already gone counts as removed
    async fn remove_artifact(&self, artifact_id: &str) -> Result<()> {
        let path = self.path(artifact_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = ?path, "Artifact already missing");
                Ok(())
            }
            Err(e) => Err(CacheError::storage(&path, e)),
        }
    }

    /// Reclaim `key` if it still maps to the expired entry seen by a reader
    async fn evict_stale(&self, key: &str, stale: &Entry) {
        let mut store = self.store.write().await;
        let still_stale = store
            .index
            .lookup(key)
            .is_some_and(|current| current == stale && current.is_expired());
        if !still_stale {
            return;
        }

        match self.remove_artifact(&stale.artifact_id).await {
            Ok(()) => {
                store.index.remove(key);
                self.expired_evictions.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to evict expired entry"),
        }
    }

    pub(crate) async fn delete_expired(&self) -> Result<usize> {
        let mut store = self.store.write().await;
        let mut removed = 0;

        for (key, entry) in store.index.expired(Utc::now()) {
            self.remove_artifact(&entry.artifact_id).await?;
            store.index.remove(&key);
            self.expired_evictions.fetch_add(1, Ordering::Relaxed);
            removed += 1;
        }

        Ok(removed)
    }
}

/// Saturates instead of overflowing for extreme TTLs
fn expires_after(ttl: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    now.checked_add_signed(ttl).unwrap_or(if ttl < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

fn check_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir).map_err(|e| CacheError::storage(dir, e))?;
    if !metadata.is_dir() {
        return Err(CacheError::storage(
            dir,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    Ok(())
}
