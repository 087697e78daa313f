//! Shared index state for tool handlers and the background watcher.
//!
//! Parsed indexes are cached in an LRU keyed by canonical path. Each entry is
//! stamped with the fingerprint of the bytes it was parsed from, and callers
//! asking for the same path while a load is running await the same future.

use crate::config::Config;
use crate::index::{SearchIndex, parse_index_bytes};
use crate::search::{DEFAULT_MIN_PARTIAL_LEN, Scorer, SearchEngine};
use crate::snapshot::{Fingerprint, SnapshotStore};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Default number of parsed indexes kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

type SharedLoadFuture = Shared<BoxFuture<'static, Result<Arc<LoadedIndex>, String>>>;

/// A parsed index together with where it came from.
#[derive(Debug, PartialEq)]
pub struct LoadedIndex {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub index: SearchIndex,
}

/// Query tuning shared by every tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub scorer: Scorer,
    pub min_partial_len: usize,
    pub default_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            scorer: Scorer::default(),
            min_partial_len: DEFAULT_MIN_PARTIAL_LEN,
            default_limit: 10,
        }
    }
}

impl SearchSettings {
    pub const fn from_config(config: &Config) -> Self {
        Self {
            scorer: config.scorer,
            min_partial_len: config.min_partial_len,
            default_limit: config.default_limit,
        }
    }

    pub fn engine<'a>(&self, index: &'a SearchIndex) -> SearchEngine<'a> {
        SearchEngine::new(index)
            .with_scorer(self.scorer)
            .with_min_partial_len(self.min_partial_len)
    }
}

/// Central coordination point for loaded indexes.
pub struct IndexState {
    cache: RwLock<LruCache<PathBuf, Arc<LoadedIndex>>>,
    in_flight: Mutex<HashMap<PathBuf, SharedLoadFuture>>,
    default_path: RwLock<Option<PathBuf>>,
    snapshots: Option<SnapshotStore>,
    settings: SearchSettings,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexState")
            .field("cache_size", &self.cache.try_read().map(|c| c.len()).ok())
            .field("has_snapshots", &self.snapshots.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl IndexState {
    pub fn new(capacity: usize, snapshots: Option<SnapshotStore>, settings: SearchSettings) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            default_path: RwLock::new(None),
            snapshots,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(
            config.cache_capacity,
            config.snapshot_root().map(SnapshotStore::new),
            SearchSettings::from_config(config),
        );
        state.default_path = RwLock::new(config.default_index.clone());
        state
    }

    pub const fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub async fn default_path(&self) -> Option<PathBuf> {
        self.default_path.read().await.clone()
    }

    pub async fn set_default_path(&self, path: PathBuf) {
        *self.default_path.write().await = Some(path);
    }

    /// Loads the index at `path`, or at the default path when `path` is `None`.
    pub async fn resolve(&self, path: Option<&str>) -> Result<Arc<LoadedIndex>, String> {
        match path {
            Some(path) => self.get(Path::new(expand_tilde(path).as_ref())).await,
            None => {
                let Some(path) = self.default_path().await else {
                    return Err("No index loaded. Call load_index with the path to a \
                                searchindex.js file, or pass `path` explicitly."
                        .to_string());
                };
                self.get(&path).await
            }
        }
    }

    /// Returns the current index at `path`, loading it if needed.
    ///
    /// 1. The file is fingerprinted
    /// 2. A cached entry with the same fingerprint is returned as is
    /// 3. An in-flight load for the path is awaited
    /// 4. Otherwise a new load starts
    pub async fn get(&self, path: &Path) -> Result<Arc<LoadedIndex>, String> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| format!("Failed to resolve {}: {}", path.display(), e))?;
        let bytes = tokio::fs::read(&canonical)
            .await
            .map_err(|e| format!("Failed to read {}: {}", canonical.display(), e))?;
        let fingerprint = Fingerprint::of(&bytes);

        {
            let mut cache = self.cache.write().await;
            if let Some(loaded) = cache.get(&canonical)
                && loaded.fingerprint == fingerprint
            {
                tracing::debug!("Cache hit for {}", canonical.display());
                return Ok(loaded.clone());
            }
        }

        let maybe_future = {
            let in_flight = self.in_flight.lock().await;
            in_flight.get(&canonical).cloned()
        };

        if let Some(future) = maybe_future {
            tracing::debug!("Awaiting in-flight load of {}", canonical.display());
            return future.await;
        }

        self.load(canonical, bytes, fingerprint).await
    }

    /// Parses (or restores from snapshot) and caches an index.
    async fn load(
        &self,
        path: PathBuf,
        bytes: Vec<u8>,
        fingerprint: Fingerprint,
    ) -> Result<Arc<LoadedIndex>, String> {
        let snapshots = self.snapshots.clone();
        let load_path = path.clone();

        let load_future: BoxFuture<'static, Result<Arc<LoadedIndex>, String>> =
            Box::pin(async move {
                let index = match &snapshots {
                    Some(store) => store.load(fingerprint).await,
                    None => None,
                };
                let index = match index {
                    Some(index) => index,
                    None => {
                        let index = tokio::task::spawn_blocking(move || parse_index_bytes(&bytes))
                            .await
                            .map_err(|e| format!("Index parsing task failed: {}", e))?
                            .map_err(|e| format!("Failed to parse {}: {}", load_path.display(), e))?;
                        if let Some(store) = &snapshots {
                            store.store(&index, fingerprint).await;
                        }
                        index
                    }
                };
                Ok(Arc::new(LoadedIndex {
                    path: load_path,
                    fingerprint,
                    index,
                }))
            });

        let shared_future = load_future.shared();

        {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.insert(path.clone(), shared_future.clone());
        }

        tracing::info!("Loading search index {}", path.display());

        let result = shared_future.await;

        {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(&path);
        }

        if let Ok(ref loaded) = result {
            let mut cache = self.cache.write().await;
            cache.put(path.clone(), loaded.clone());
            tracing::debug!(
                "Cached {} ({} documents, fingerprint {})",
                path.display(),
                loaded.index.document_count(),
                loaded.fingerprint
            );
        }

        result
    }

    /// Reloads cached indexes whose file content changed and evicts those
    /// whose file disappeared. Returns the number of reloaded indexes.
    pub async fn refresh_changed(&self) -> usize {
        let entries: Vec<(PathBuf, Fingerprint)> = {
            let cache = self.cache.read().await;
            cache
                .iter()
                .map(|(path, loaded)| (path.clone(), loaded.fingerprint))
                .collect()
        };

        let mut reloaded = 0;
        for (path, old) in entries {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Evicting {}: {}", path.display(), e);
                    self.cache.write().await.pop(&path);
                    continue;
                }
            };
            let current = Fingerprint::of(&bytes);
            if current == old {
                continue;
            }

            tracing::info!("Index {} changed, reloading", path.display());
            match self.load(path.clone(), bytes, current).await {
                Ok(_) => reloaded += 1,
                Err(e) => tracing::warn!("Reload of {} failed: {}", path.display(), e),
            }

            tokio::task::yield_now().await;
        }
        reloaded
    }

    pub async fn is_cached(&self, path: &Path) -> bool {
        self.cache.read().await.contains(path)
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        self.in_flight.lock().await.clear();
    }
}

/// Background task keeping cached indexes in step with their files.
pub struct Watcher {
    state: Arc<IndexState>,
    period: Duration,
}

impl Watcher {
    pub const fn new(state: Arc<IndexState>, period: Duration) -> Self {
        Self { state, period }
    }

    /// Runs forever, checking every `period`.
    pub async fn run(&self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reloaded = self.state.refresh_changed().await;
            if reloaded > 0 {
                tracing::debug!("Watcher reloaded {} index(es)", reloaded);
            }
        }
    }
}

/// Spawns the watcher as a tokio task.
pub fn spawn_watcher(state: Arc<IndexState>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        Watcher::new(state, period).run().await;
    })
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// Returns `Cow::Borrowed` if no expansion needed, `Cow::Owned` if expanded.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
