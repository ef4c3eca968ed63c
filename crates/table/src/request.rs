//! Desired visual state of a stack and the request that loads it.

use std::task::{Context, Poll};

use asset::{CardKind, ResourceCategory, ResourceKey};
use cache::{ResourceCache, ResourceHandle, ResourceLoadError};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use renderer::{MaterialSet, Orientation};

/// What a stack should look like: enough to pick resources and build geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualState {
    pub kind: CardKind,
    /// Face artwork of the top card, `None` when no face is ever shown.
    pub top_face: Option<String>,
    pub card_count: usize,
    pub orientation: Orientation,
}

impl VisualState {
    pub fn empty(kind: CardKind) -> Self {
        Self {
            kind,
            top_face: None,
            card_count: 0,
            orientation: Orientation::FaceDown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.card_count == 0
    }

    /// Resources a render of this state binds. Empty stacks need none.
    pub fn required_keys(&self, normal_map: &str) -> Vec<ResourceKey> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut keys = vec![
            ResourceKey::edge(self.kind),
            ResourceKey::back(self.kind),
            ResourceKey::normal_map(normal_map),
        ];
        if let Some(face) = &self.top_face {
            keys.push(ResourceKey::face(face.clone()));
        }
        keys
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    /// Waiting for at least one acquisition.
    Pending,
    /// Every acquisition resolved.
    Ready,
    /// A newer request replaced this one.
    Superseded,
    Failed(ResourceLoadError),
}

type JoinedHandles = BoxFuture<'static, Result<Vec<ResourceHandle>, ResourceLoadError>>;

/// One pending visual change of a stack.
///
/// Holds exactly one cache reference per key in `keys` from `issue` until it
/// is either converted into applied resources or discarded.
pub struct UpdateRequest {
    generation: u64,
    desired: VisualState,
    keys: Vec<ResourceKey>,
    join: Option<JoinedHandles>,
    handles: Vec<ResourceHandle>,
    status: RequestStatus,
}

impl UpdateRequest {
    pub fn issue(
        generation: u64,
        desired: VisualState,
        cache: &ResourceCache,
        normal_map: &str,
    ) -> Self {
        let keys = desired.required_keys(normal_map);
        let (join, status) = if keys.is_empty() {
            (None, RequestStatus::Ready)
        } else {
            let acquisitions: Vec<_> = keys.iter().map(|key| cache.acquire(key)).collect();
            (
                Some(try_join_all(acquisitions).boxed()),
                RequestStatus::Pending,
            )
        };
        log::debug!(
            "request #{}: {} cards, top {:?}, {} resources",
            generation,
            desired.card_count,
            desired.top_face,
            keys.len()
        );
        Self {
            generation,
            desired,
            keys,
            join,
            handles: Vec::new(),
            status,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn desired(&self) -> &VisualState {
        &self.desired
    }

    pub fn keys(&self) -> &[ResourceKey] {
        &self.keys
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    /// Observe load completions without blocking.
    pub fn poll(&mut self) -> &RequestStatus {
        if self.status == RequestStatus::Pending {
            if let Some(join) = self.join.as_mut() {
                let waker = futures::task::noop_waker();
                let mut cx = Context::from_waker(&waker);
                match join.poll_unpin(&mut cx) {
                    Poll::Ready(Ok(handles)) => {
                        self.handles = handles;
                        self.status = RequestStatus::Ready;
                        self.join = None;
                    }
                    Poll::Ready(Err(error)) => {
                        self.status = RequestStatus::Failed(error);
                        self.join = None;
                    }
                    Poll::Pending => {}
                }
            }
        }
        &self.status
    }

    /// Materials for the geometry. `None` for an empty state or before ready.
    pub fn materials(&self) -> Option<MaterialSet> {
        if self.status != RequestStatus::Ready {
            return None;
        }
        let find = |category: ResourceCategory| {
            self.handles
                .iter()
                .find(|h| h.key().category == category)
                .cloned()
        };
        Some(MaterialSet {
            edge: find(ResourceCategory::CardEdge)?,
            face: find(ResourceCategory::CardFace),
            back: find(ResourceCategory::CardBack)?,
            normal: find(ResourceCategory::NormalMap)?,
        })
    }

    /// Hand the held references over to whoever applies this state.
    pub fn into_applied(self) -> (VisualState, Vec<ResourceKey>, Vec<ResourceHandle>) {
        (self.desired, self.keys, self.handles)
    }

    /// Mark superseded and give every reference back. An in-flight load keeps
    /// running inside the cache and is disposed when it settles.
    pub fn supersede(self, cache: &ResourceCache) {
        log::debug!("request #{} {:?}", self.generation, RequestStatus::Superseded);
        self.discard(cache);
    }

    /// Give every reference back without applying.
    pub fn discard(self, cache: &ResourceCache) {
        release_keys(cache, &self.keys);
    }
}

/// Release one reference per key. Underflow means the reference accounting
/// is broken: fatal in debug builds, logged loudly otherwise.
pub(crate) fn release_keys(cache: &ResourceCache, keys: &[ResourceKey]) {
    for key in keys {
        if let Err(err) = cache.release(key) {
            log::error!("{err}");
            debug_assert!(false, "{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::{AssetCatalog, AssetQuality};
    use cache::testing::ManualLoader;

    fn setup() -> (ManualLoader, ResourceCache) {
        let loader = ManualLoader::new();
        let cache = ResourceCache::new(
            loader.clone(),
            AssetCatalog::standard("public", AssetQuality::High),
        );
        (loader, cache)
    }

    fn fool_state() -> VisualState {
        VisualState {
            kind: CardKind::Tarot,
            top_face: Some("0_the_fool".to_string()),
            card_count: 1,
            orientation: Orientation::FaceDown,
        }
    }

    #[test]
    fn empty_state_is_ready_without_resources() {
        let (loader, cache) = setup();
        let mut request = UpdateRequest::issue(1, VisualState::empty(CardKind::Tarot), &cache, "paper");
        assert_eq!(request.status(), &RequestStatus::Ready);
        assert_eq!(request.poll(), &RequestStatus::Ready);
        assert!(request.keys().is_empty());
        assert!(loader.calls().is_empty());
        assert!(request.materials().is_none());
    }

    #[test]
    fn ready_only_after_every_resource() {
        let (loader, cache) = setup();
        let mut request = UpdateRequest::issue(1, fool_state(), &cache, "paper");
        assert_eq!(request.keys().len(), 4);
        assert_eq!(request.poll(), &RequestStatus::Pending);

        loader.complete("0_the_fool.jpg");
        loader.complete("tarot/back.jpg");
        loader.complete("tarot/edge.jpg");
        assert_eq!(request.poll(), &RequestStatus::Pending);

        loader.complete("paper_normal.jpg");
        assert_eq!(request.poll(), &RequestStatus::Ready);

        let materials = request.materials().expect("materials");
        assert_eq!(materials.face.as_ref().map(|h| h.key().name.as_str()), Some("0_the_fool"));
        assert_eq!(materials.back.key(), &ResourceKey::back(CardKind::Tarot));
    }

    #[test]
    fn any_failure_fails_the_request() {
        let (loader, cache) = setup();
        let mut request = UpdateRequest::issue(3, fool_state(), &cache, "paper");
        loader.fail("tarot/edge.jpg");
        assert!(matches!(request.poll(), RequestStatus::Failed(_)));

        request.discard(&cache);
        // Failed edge entry had only this reference; the rest are still loading.
        assert!(!cache.contains(&ResourceKey::edge(CardKind::Tarot)));
        assert_eq!(cache.ref_count(&ResourceKey::face("0_the_fool")), Some(0));
    }

    #[test]
    fn supersede_releases_references() {
        let (loader, cache) = setup();
        let request = UpdateRequest::issue(1, fool_state(), &cache, "paper");
        request.supersede(&cache);
        assert_eq!(cache.ref_count(&ResourceKey::back(CardKind::Tarot)), Some(0));

        loader.complete_all();
        cache.pump();
        assert!(cache.is_empty());
    }
}
