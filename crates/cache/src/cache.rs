use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use asset::{AssetCatalog, AssetLoader, ResourceKey};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::entry::{EntryState, EntryStatus, ResourceEntry, ResourceHandle};
use crate::error::{ResourceLoadError, UnderflowError};
use crate::future::ResourceFuture;

/// Counters for load and eviction traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub loads_started: u64,
    pub loads_completed: u64,
    pub loads_failed: u64,
    pub evictions: u64,
}

pub(crate) struct CacheState {
    entries: HashMap<ResourceKey, ResourceEntry>,
    next_id: u64,
    stats: CacheStats,
}

impl CacheState {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
            stats: CacheStats::default(),
        }
    }

    /// Resolve `key` for an awaiting future, advancing its load if needed.
    pub(crate) fn drive(
        &mut self,
        key: &ResourceKey,
        cx: &mut Context<'_>,
    ) -> Poll<Result<ResourceHandle, ResourceLoadError>> {
        self.poll_task(key, cx);
        let Some(entry) = self.entries.get_mut(key) else {
            return Poll::Ready(Err(ResourceLoadError::Evicted { key: key.clone() }));
        };
        match entry.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                entry.register_waiter(cx.waker());
                Poll::Pending
            }
        }
    }

    /// Poll the entry's load task once. Returns `true` if it settled now.
    fn poll_task(&mut self, key: &ResourceKey, cx: &mut Context<'_>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(task) = entry.task.as_mut() else {
            return false;
        };
        let Poll::Ready(result) = task.poll_unpin(cx) else {
            return false;
        };

        entry.task = None;
        match result {
            Ok(texture) => {
                let id = self.next_id;
                self.next_id += 1;
                self.stats.loads_completed += 1;
                log::info!("cache: {} resident (handle #{})", key, id);
                entry.state = EntryState::Ready(ResourceHandle::new(id, key.clone(), texture));
            }
            Err(err) => {
                self.stats.loads_failed += 1;
                log::warn!("cache: loading {} failed: {}", key, err);
                entry.state = EntryState::Failed(err.into());
            }
        }
        entry.wake_all();

        if entry.is_evictable() {
            log::debug!("cache: {} finished loading with no references left", key);
            self.evict(key);
        }
        true
    }

    fn evict(&mut self, key: &ResourceKey) {
        if self.entries.remove(key).is_some() {
            self.stats.evictions += 1;
            log::debug!("cache: disposed {}", key);
        }
    }
}

/// Shared cache handle. Clones refer to the same store.
///
/// All state sits behind one mutex, so `acquire`, `release` and load
/// completion are serialized even if entities live on different threads.
/// Loader tasks are polled while that lock is held and must not call back
/// into the cache.
#[derive(Clone)]
pub struct ResourceCache {
    state: Arc<Mutex<CacheState>>,
    loader: Arc<dyn AssetLoader>,
    catalog: Arc<AssetCatalog>,
}

impl ResourceCache {
    pub fn new(loader: impl AssetLoader + 'static, catalog: AssetCatalog) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::new())),
            loader: Arc::new(loader),
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Take one reference to `key`, starting its load if nobody holds it yet.
    ///
    /// The returned future resolves to the handle (already resolved when the
    /// entry is resident). The reference is owned by the caller whether the
    /// load succeeds or fails, and must be given back with [`release`].
    ///
    /// [`release`]: ResourceCache::release
    pub fn acquire(&self, key: &ResourceKey) -> ResourceFuture {
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get_mut(key) {
            entry.ref_count += 1;
            log::debug!("cache: acquire {} (refs={})", key, entry.ref_count);
            let outcome = entry.outcome();
            return ResourceFuture::new(key.clone(), Arc::clone(&self.state), outcome);
        }

        let entry = match self.catalog.path_for(key) {
            Some(path) => {
                state.stats.loads_started += 1;
                log::info!("cache: loading {} from {}", key, path);
                ResourceEntry::loading(self.loader.load(&path))
            }
            None => {
                state.stats.loads_failed += 1;
                log::warn!("cache: {} is not in the asset catalog", key);
                ResourceEntry::failed(ResourceLoadError::NotInCatalog { key: key.clone() })
            }
        };
        let outcome = entry.outcome();
        state.entries.insert(key.clone(), entry);
        ResourceFuture::new(key.clone(), Arc::clone(&self.state), outcome)
    }

    /// Give back one reference. The last release of a settled entry disposes
    /// it; a still-loading entry is disposed as soon as its load settles.
    pub fn release(&self, key: &ResourceKey) -> Result<(), UnderflowError> {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return Err(UnderflowError { key: key.clone() });
        };
        if entry.ref_count == 0 {
            return Err(UnderflowError { key: key.clone() });
        }
        entry.ref_count -= 1;
        log::debug!("cache: release {} (refs={})", key, entry.ref_count);
        if entry.is_evictable() {
            state.evict(key);
        }
        Ok(())
    }

    /// Advance every in-flight load once without blocking. Returns how many
    /// loads settled. Call once per frame so loads nobody awaits any more
    /// still finish and get disposed.
    ///
    /// Each load is polled with a waker that wakes the tasks awaiting it, so
    /// an executor awaiting a [`ResourceFuture`] is not left to the next pump.
    pub fn pump(&self) -> usize {
        let mut state = self.state.lock();
        let in_flight: Vec<(ResourceKey, Waker)> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.task.is_some())
            .map(|(key, entry)| (key.clone(), entry.task_waker()))
            .collect();

        in_flight
            .iter()
            .filter(|(key, waker)| state.poll_task(key, &mut Context::from_waker(waker)))
            .count()
    }

    /// Handle of a resident entry without taking a reference.
    pub fn peek(&self, key: &ResourceKey) -> Option<ResourceHandle> {
        let state = self.state.lock();
        match &state.entries.get(key)?.state {
            EntryState::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn ref_count(&self, key: &ResourceKey) -> Option<u32> {
        self.state.lock().entries.get(key).map(|e| e.ref_count)
    }

    pub fn status(&self, key: &ResourceKey) -> Option<EntryStatus> {
        self.state.lock().entries.get(key).map(ResourceEntry::status)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}
