use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use asset::ResourceKey;
use parking_lot::Mutex;

use crate::cache::CacheState;
use crate::entry::ResourceHandle;
use crate::error::ResourceLoadError;

/// Completion of one `acquire`. Polling it also advances the shared load, so
/// it makes progress under any executor as well as from a frame tick.
///
/// Dropping the future does not give the reference back.
#[must_use = "the acquired reference must still be released"]
pub struct ResourceFuture {
    key: ResourceKey,
    state: Arc<Mutex<CacheState>>,
    settled: Option<Result<ResourceHandle, ResourceLoadError>>,
}

impl ResourceFuture {
    pub(crate) fn new(
        key: ResourceKey,
        state: Arc<Mutex<CacheState>>,
        settled: Option<Result<ResourceHandle, ResourceLoadError>>,
    ) -> Self {
        Self {
            key,
            state,
            settled,
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// `true` when the entry was already ready (or failed) at acquire time.
    pub fn is_resolved(&self) -> bool {
        self.settled.is_some()
    }
}

impl Future for ResourceFuture {
    type Output = Result<ResourceHandle, ResourceLoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(settled) = self.settled.take() {
            return Poll::Ready(settled);
        }
        let mut state = self.state.lock();
        state.drive(&self.key, cx)
    }
}
