use std::fmt;
use std::sync::Arc;
use std::task::Waker;

use asset::{LoadTask, ResourceKey, TextureData};
use futures::task::ArcWake;

use crate::error::ResourceLoadError;

/// Opaque handle to a resident visual resource.
///
/// Cloning a handle does not take a cache reference; ownership is tracked by
/// `acquire`/`release` pairs only.
#[derive(Clone)]
pub struct ResourceHandle {
    id: u64,
    key: ResourceKey,
    texture: Arc<TextureData>,
}

impl ResourceHandle {
    pub(crate) fn new(id: u64, key: ResourceKey, texture: TextureData) -> Self {
        Self {
            id,
            key,
            texture: Arc::new(texture),
        }
    }

    /// Unique per load; a reloaded resource gets a new id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn texture(&self) -> &TextureData {
        &self.texture
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceHandle {}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("size", &(self.texture.width, self.texture.height))
            .finish()
    }
}

/// Public view of an entry's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    Loading,
    Ready,
    Failed,
}

/// The handle exists iff the entry is ready.
pub(crate) enum EntryState {
    Loading,
    Ready(ResourceHandle),
    Failed(ResourceLoadError),
}

pub(crate) struct ResourceEntry {
    pub(crate) state: EntryState,
    /// Present while `state` is `Loading`.
    pub(crate) task: Option<LoadTask>,
    pub(crate) ref_count: u32,
    pub(crate) waiters: Vec<Waker>,
}

impl ResourceEntry {
    pub(crate) fn loading(task: LoadTask) -> Self {
        Self {
            state: EntryState::Loading,
            task: Some(task),
            ref_count: 1,
            waiters: Vec::new(),
        }
    }

    pub(crate) fn failed(error: ResourceLoadError) -> Self {
        Self {
            state: EntryState::Failed(error),
            task: None,
            ref_count: 1,
            waiters: Vec::new(),
        }
    }

    pub(crate) fn status(&self) -> EntryStatus {
        match self.state {
            EntryState::Loading => EntryStatus::Loading,
            EntryState::Ready(_) => EntryStatus::Ready,
            EntryState::Failed(_) => EntryStatus::Failed,
        }
    }

    /// Settled outcome, `None` while loading.
    pub(crate) fn outcome(&self) -> Option<Result<ResourceHandle, ResourceLoadError>> {
        match &self.state {
            EntryState::Loading => None,
            EntryState::Ready(handle) => Some(Ok(handle.clone())),
            EntryState::Failed(error) => Some(Err(error.clone())),
        }
    }

    /// Loading entries are never evicted, even without references.
    pub(crate) fn is_evictable(&self) -> bool {
        self.ref_count == 0 && !matches!(self.state, EntryState::Loading)
    }

    pub(crate) fn register_waiter(&mut self, waker: &Waker) {
        if !self.waiters.iter().any(|w| w.will_wake(waker)) {
            self.waiters.push(waker.clone());
        }
    }

    /// Waker for polling the load on behalf of everyone awaiting it, so the
    /// loader's completion still reaches them.
    pub(crate) fn task_waker(&self) -> Waker {
        if self.waiters.is_empty() {
            futures::task::noop_waker()
        } else {
            futures::task::waker(Arc::new(FanOut(self.waiters.clone())))
        }
    }

    pub(crate) fn wake_all(&mut self) {
        for waker in self.waiters.drain(..) {
            waker.wake();
        }
    }
}

struct FanOut(Vec<Waker>);

impl ArcWake for FanOut {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        for waker in &arc_self.0 {
            waker.wake_by_ref();
        }
    }
}
