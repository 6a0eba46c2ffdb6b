//! TTL cache store with stale-on-failure fallback.
//!
//! Entries live in memory and, when a directory is configured, are written
//! through to one JSON file per key so they survive a restart. Expiry is
//! checked lazily when an entry is read; nothing is evicted in the
//! background except by the capacity bound.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::GatewayError;

use super::entry::{CacheEntry, Payload};
use super::error::CacheError;
use super::key::CacheKey;

/// Default TTL: 7 days.
const DEFAULT_TTL_DAYS: i64 = 7;

/// Configuration for the TTL store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry counts as fresh.
    pub ttl: Duration,

    /// Maximum number of in-memory entries.
    pub max_capacity: u64,

    /// Directory for persisted entries. `None` keeps the cache in memory only.
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::days(DEFAULT_TTL_DAYS),
            max_capacity: 1000,
            dir: None,
        }
    }
}

type RefreshOutcome = Result<Arc<CacheEntry>, Arc<GatewayError>>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Cache-aside store for slowly-changing entities.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct TtlStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    entries: MokaCache<CacheKey, Arc<CacheEntry>>,
    /// Refreshes currently running, so concurrent callers share one fetch.
    in_flight: Mutex<HashMap<CacheKey, PendingRefresh>>,
    ttl: Duration,
    dir: Option<PathBuf>,
}

impl TtlStore {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner: Arc::new(StoreInner {
                entries,
                in_flight: Mutex::new(HashMap::new()),
                ttl: config.ttl,
                dir: config.dir.clone(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Approximate number of entries held in memory.
    pub fn entry_count(&self) -> u64 {
        self.inner.entries.entry_count()
    }

    /// Load persisted entries from the cache directory.
    ///
    /// Files that cannot be read or parsed are skipped. Returns the number
    /// of entries loaded.
    pub async fn init(&self) -> Result<usize, CacheError> {
        let Some(dir) = &self.inner.dir else {
            return Ok(0);
        };

        tokio::fs::create_dir_all(dir).await.map_err(|e| io_error(dir, e))?;
        let mut files = tokio::fs::read_dir(dir).await.map_err(|e| io_error(dir, e))?;

        let mut loaded = 0;
        while let Some(file) = files.next_entry().await.map_err(|e| io_error(dir, e))? {
            let path = file.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match read_entry(&path).await {
                Ok(entry) => {
                    self.inner
                        .entries
                        .insert(entry.key.clone(), Arc::new(entry))
                        .await;
                    loaded += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable cache file"),
            }
        }

        info!(loaded, dir = %dir.display(), "loaded persisted cache entries");
        Ok(loaded)
    }

    /// The entry under `key`, whatever its age.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.entries.get(key).await
    }

    /// The entry under `key` if it is still fresh.
    pub async fn get_fresh(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.get(key)
            .await
            .filter(|e| !e.is_expired(self.inner.ttl, Utc::now()))
    }

    /// Store `payload` under `key` with a fresh timestamp.
    ///
    /// A failed disk write is logged; the in-memory entry is kept either way.
    pub async fn put(&self, key: CacheKey, payload: Payload) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(key.clone(), payload, Utc::now()));
        self.inner.entries.insert(key, Arc::clone(&entry)).await;

        if let Err(e) = self.persist(&entry).await {
            warn!(key = %entry.key, error = %e, "failed to persist cache entry");
        }
        entry
    }

    /// Drop one entry.
    pub async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.inner.entries.invalidate(key).await;

        if let Some(dir) = &self.inner.dir {
            let path = dir.join(key.file_name());
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path, e)),
            }
        }
        Ok(())
    }

    /// Drop every entry, in memory and on disk.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.inner.entries.invalidate_all();

        let Some(dir) = &self.inner.dir else {
            return Ok(());
        };
        let mut files = match tokio::fs::read_dir(dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_error(dir, e)),
        };
        while let Some(file) = files.next_entry().await.map_err(|e| io_error(dir, e))? {
            let path = file.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| io_error(&path, e))?;
            }
        }

        info!(dir = %dir.display(), "cleared cache");
        Ok(())
    }

    /// Return the fresh entry for `key`, refreshing it with `fetch` if it is
    /// missing or expired.
    ///
    /// If the refresh fails, an existing entry is returned regardless of its
    /// age; only when there is none does the error reach the caller.
    /// Concurrent callers for the same key share one refresh.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<Arc<CacheEntry>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Payload, GatewayError>> + Send + 'static,
    {
        let previous = self.get(&key).await;
        if let Some(entry) = &previous
            && !entry.is_expired(self.inner.ttl, Utc::now())
        {
            return Ok(Arc::clone(entry));
        }

        debug!(%key, stale = previous.is_some(), "refreshing cache entry");
        let refresh = self.pending_refresh(&key, fetch).await;

        match refresh.await {
            Ok(entry) => Ok(entry),
            Err(error) => match previous {
                Some(stale) => {
                    warn!(
                        %key,
                        %error,
                        age_mins = stale.age(Utc::now()).num_minutes(),
                        "refresh failed; serving stale entry"
                    );
                    Ok(stale)
                }
                None => Err(CacheError::Refresh { key, source: error }),
            },
        }
    }

    /// Join the refresh already running for `key`, or start one.
    async fn pending_refresh<F, Fut>(&self, key: &CacheKey, fetch: F) -> PendingRefresh
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Payload, GatewayError>> + Send + 'static,
    {
        let mut in_flight = self.inner.in_flight.lock().await;
        if let Some(pending) = in_flight.get(key) {
            debug!(%key, "joining in-flight refresh");
            return pending.clone();
        }

        let store = self.clone();
        let owned_key = key.clone();
        let fetching = fetch();
        let refresh = async move {
            let outcome = match fetching.await {
                Ok(payload) => Ok(store.put(owned_key.clone(), payload).await),
                Err(e) => Err(Arc::new(e)),
            };
            store.inner.in_flight.lock().await.remove(&owned_key);
            outcome
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), refresh.clone());
        refresh
    }

    async fn persist(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let Some(dir) = &self.inner.dir else {
            return Ok(());
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, e))?;

        let path = dir.join(entry.key.file_name());
        let json = serde_json::to_string_pretty(entry).map_err(|e| CacheError::Io {
            path: path.clone(),
            message: format!("failed to serialize entry: {e}"),
        })?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| io_error(&path, e))
    }
}

async fn read_entry(path: &Path) -> Result<CacheEntry, CacheError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    serde_json::from_str(&contents).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        message: format!("invalid cache file: {e}"),
    })
}

fn io_error(path: &Path, e: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
