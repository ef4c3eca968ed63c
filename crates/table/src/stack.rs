//! Card stack entity: the card list, its pending visual update and the
//! currently rendered state.

use std::fmt;
use std::sync::Arc;

use asset::{CardKind, ResourceKey};
use cache::{ResourceCache, ResourceHandle, ResourceLoadError};
use corelib::Vec3;
use corelib::spatial::{Aabb, BoundingSet, Ray, VolumeKind};
use renderer::{GeometryHandle, GeometryRequest, Orientation, RenderBackend, SceneGraph};

use crate::card::CardInstance;
use crate::config::TableConfig;
use crate::error::StackError;
use crate::request::{RequestStatus, UpdateRequest, VisualState, release_keys};
use crate::rng::TableRng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StackStyle {
    /// Regular deck; the top face is loaded and orientation follows the deck,
    /// except that a lone card shows its own side.
    #[default]
    Deck,
    /// Lone card; orientation follows the card's own face-down flag.
    Single,
    /// Fixed-height pile of backs, independent of the card list.
    Decorative,
}

/// Construction parameters for a [`StackEntity`].
#[derive(Clone, Debug)]
pub struct StackSpec {
    pub label: String,
    pub kind: CardKind,
    pub cards: Vec<CardInstance>,
    pub face_down: bool,
    pub style: StackStyle,
    pub position: Vec3,
    pub seed: u64,
}

impl StackSpec {
    pub fn deck(label: impl Into<String>, kind: CardKind, cards: Vec<CardInstance>) -> Self {
        Self {
            label: label.into(),
            kind,
            cards,
            face_down: true,
            style: StackStyle::Deck,
            position: Vec3::ZERO,
            seed: 0,
        }
    }

    pub fn single(label: impl Into<String>, card: CardInstance) -> Self {
        Self {
            face_down: card.face_down,
            style: StackStyle::Single,
            ..Self::deck(label, card.kind, vec![card])
        }
    }

    pub fn decorative(label: impl Into<String>, kind: CardKind) -> Self {
        Self {
            style: StackStyle::Decorative,
            ..Self::deck(label, kind, Vec::new())
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_face_down(mut self, face_down: bool) -> Self {
        self.face_down = face_down;
        self
    }
}

/// A request that ended in a load failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureReport {
    pub label: String,
    pub generation: u64,
    pub error: ResourceLoadError,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: update #{} failed: {}",
            self.label, self.generation, self.error
        )
    }
}

type FailureObserver = Box<dyn FnMut(&FailureReport) + Send>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing pending.
    Idle,
    Waiting { generation: u64 },
    Applied { generation: u64 },
    Failed { generation: u64, error: ResourceLoadError },
}

/// What is on screen right now, and the references keeping it there.
struct AppliedState {
    generation: u64,
    visual: VisualState,
    keys: Vec<ResourceKey>,
    handles: Vec<ResourceHandle>,
    geometry: Option<GeometryHandle>,
}

pub struct StackEntity {
    label: String,
    kind: CardKind,
    style: StackStyle,
    cards: Vec<CardInstance>,
    face_down: bool,
    cache: ResourceCache,
    config: Arc<TableConfig>,
    rng: TableRng,
    generation: u64,
    pending: Option<UpdateRequest>,
    applied: Option<AppliedState>,
    bounds: BoundingSet,
    hovered: bool,
    last_failure: Option<FailureReport>,
    observer: Option<FailureObserver>,
}

impl StackEntity {
    /// Create the entity and issue its first update request.
    pub fn new(spec: StackSpec, cache: ResourceCache, config: Arc<TableConfig>) -> Self {
        let rng = TableRng::new(spec.seed);
        Self::with_rng(spec, cache, config, rng)
    }

    pub(crate) fn with_rng(
        spec: StackSpec,
        cache: ResourceCache,
        config: Arc<TableConfig>,
        rng: TableRng,
    ) -> Self {
        let mut entity = Self {
            label: spec.label,
            kind: spec.kind,
            style: spec.style,
            cards: spec.cards,
            face_down: spec.face_down,
            cache,
            config,
            rng,
            generation: 0,
            pending: None,
            applied: None,
            bounds: BoundingSet::new(spec.position),
            hovered: false,
            last_failure: None,
            observer: None,
        };
        entity.issue();
        entity
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> CardKind {
        self.kind
    }

    pub fn style(&self) -> StackStyle {
        self.style
    }

    /// Bottom first, top last.
    pub fn cards(&self) -> &[CardInstance] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<&CardInstance> {
        self.cards.last()
    }

    pub fn is_face_down(&self) -> bool {
        self.face_down
    }

    /// Mutations are rejected while an update is outstanding.
    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(UpdateRequest::generation)
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn applied_visual(&self) -> Option<&VisualState> {
        self.applied.as_ref().map(|a| &a.visual)
    }

    pub fn applied_generation(&self) -> Option<u64> {
        self.applied.as_ref().map(|a| a.generation)
    }

    /// Resources bound by the applied state.
    pub fn applied_handles(&self) -> &[ResourceHandle] {
        self.applied.as_ref().map_or(&[], |a| a.handles.as_slice())
    }

    pub fn geometry(&self) -> Option<GeometryHandle> {
        self.applied.as_ref().and_then(|a| a.geometry)
    }

    pub fn bounds(&self) -> &BoundingSet {
        &self.bounds
    }

    pub fn position(&self) -> Vec3 {
        self.bounds.position()
    }

    pub fn last_failure(&self) -> Option<&FailureReport> {
        self.last_failure.as_ref()
    }

    pub fn set_failure_observer(&mut self, observer: impl FnMut(&FailureReport) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn push(&mut self, card: CardInstance) -> Result<(), StackError> {
        self.ensure_unlocked()?;
        self.cards.push(card);
        self.issue();
        Ok(())
    }

    pub fn pop(&mut self) -> Result<CardInstance, StackError> {
        if self.cards.is_empty() {
            return Err(StackError::Empty);
        }
        self.ensure_unlocked()?;
        let card = self.cards.pop().ok_or(StackError::Empty)?;
        self.issue();
        Ok(card)
    }

    /// Shuffle `iterations` times. Returns `false` (and leaves the order
    /// alone) while locked.
    pub fn shuffle(&mut self, iterations: u32, regenerate: bool) -> bool {
        if self.is_locked() {
            log::debug!("{}: shuffle skipped, update pending", self.label);
            return false;
        }
        for _ in 0..iterations {
            self.rng.shuffle(&mut self.cards);
        }
        if regenerate {
            self.issue();
        }
        true
    }

    pub fn shuffle_default(&mut self) -> bool {
        self.shuffle(self.config.shuffle_iterations, true)
    }

    /// Turn the stack over. A single card flips itself.
    pub fn flip(&mut self) -> Result<(), StackError> {
        self.ensure_unlocked()?;
        match self.style {
            StackStyle::Single => {
                if let Some(card) = self.cards.last_mut() {
                    *card = card.with_face_down(!card.face_down);
                }
            }
            StackStyle::Deck | StackStyle::Decorative => self.face_down = !self.face_down,
        }
        self.issue();
        Ok(())
    }

    /// Issue a fresh request for the current cards, replacing any pending
    /// one. Used to retry after a failed load.
    pub fn request_rebuild(&mut self) -> u64 {
        self.issue();
        self.generation
    }

    pub fn set_position<S>(&mut self, position: Vec3, scene: &mut S)
    where
        S: SceneGraph + ?Sized,
    {
        self.bounds.set_position(position);
        if let Some(geometry) = self.geometry() {
            scene.set_transform(geometry, position);
        }
    }

    pub fn hit_test(&self, ray: &Ray) -> bool {
        self.bounds.hit_test(ray)
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Halo shows under the cursor, and always around an empty stack.
    pub fn halo_visible(&self) -> bool {
        self.applied
            .as_ref()
            .is_some_and(|a| self.hovered || a.visual.is_empty())
    }

    /// Advance the pending request. Applies it once every resource it needs
    /// is resident; does nothing when no request is pending.
    pub fn tick<R>(&mut self, renderer: &mut R) -> TickOutcome
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        let Some(mut request) = self.pending.take() else {
            return TickOutcome::Idle;
        };
        let generation = request.generation();
        match request.poll().clone() {
            RequestStatus::Pending => {
                self.pending = Some(request);
                TickOutcome::Waiting { generation }
            }
            RequestStatus::Ready => {
                self.apply(request, renderer);
                TickOutcome::Applied { generation }
            }
            RequestStatus::Failed(error) => {
                request.discard(&self.cache);
                self.report_failure(generation, error.clone());
                TickOutcome::Failed { generation, error }
            }
            // Replaced requests are consumed by `issue` and never stored.
            RequestStatus::Superseded => TickOutcome::Idle,
        }
    }

    /// Give back every reference and remove the geometry from the scene.
    pub fn dispose<R>(mut self, renderer: &mut R)
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        if let Some(request) = self.pending.take() {
            request.supersede(&self.cache);
        }
        if let Some(applied) = self.applied.take() {
            release_keys(&self.cache, &applied.keys);
            if let Some(geometry) = applied.geometry {
                renderer.detach(geometry);
                renderer.release_geometry(geometry);
            }
        }
        log::debug!("{}: disposed", self.label);
    }

    fn ensure_unlocked(&self) -> Result<(), StackError> {
        match self.pending_generation() {
            Some(generation) => Err(StackError::Locked { generation }),
            None => Ok(()),
        }
    }

    fn desired_visual(&self) -> VisualState {
        if self.style == StackStyle::Decorative {
            return VisualState {
                kind: self.kind,
                top_face: None,
                card_count: self.config.deck_visual_height,
                orientation: Orientation::from_face_down(self.face_down),
            };
        }
        let Some(top) = self.cards.last() else {
            return VisualState::empty(self.kind);
        };
        // A lone card shows whichever side it was put down with.
        let face_down = if self.style == StackStyle::Single || self.cards.len() == 1 {
            top.face_down
        } else {
            self.face_down
        };
        VisualState {
            kind: self.kind,
            top_face: Some(top.face_name(self.cache.catalog())),
            card_count: self.cards.len(),
            orientation: Orientation::from_face_down(face_down),
        }
    }

    /// Acquire for the new state before releasing the replaced request, so
    /// shared resources are not evicted and reloaded in between.
    fn issue(&mut self) {
        self.generation += 1;
        let desired = self.desired_visual();
        let request = UpdateRequest::issue(
            self.generation,
            desired,
            &self.cache,
            &self.config.normal_map,
        );
        if let Some(previous) = self.pending.replace(request) {
            previous.supersede(&self.cache);
        }
    }

    fn layer_step(&self) -> f32 {
        match self.style {
            StackStyle::Decorative => self.config.deck_gap,
            _ => self.config.card_thickness,
        }
    }

    fn apply<R>(&mut self, request: UpdateRequest, renderer: &mut R)
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        debug_assert_eq!(request.generation(), self.generation);
        let generation = request.generation();
        let materials = request.materials();
        let (visual, keys, handles) = request.into_applied();

        let previous = self.applied.take();
        let had_geometry = previous.as_ref().is_some_and(|p| p.geometry.is_some());
        if let Some(previous) = previous {
            release_keys(&self.cache, &previous.keys);
            if let Some(geometry) = previous.geometry {
                renderer.detach(geometry);
                renderer.release_geometry(geometry);
            }
        }

        let dims = self.config.dimensions();
        let layer_step = self.layer_step();
        let geometry = match materials {
            Some(materials) => {
                let geometry = renderer.build_geometry(&GeometryRequest {
                    card_count: visual.card_count,
                    orientation: visual.orientation,
                    jitter_seed: self.rng.next_seed(),
                    layer_step,
                    dims,
                });
                renderer.attach(geometry, &materials);
                renderer.set_transform(geometry, self.bounds.position());
                if had_geometry {
                    log::info!("{}: mesh updated ({} cards)", self.label, visual.card_count);
                } else {
                    log::info!("{}: mesh created ({} cards)", self.label, visual.card_count);
                }
                Some(geometry)
            }
            None => {
                if !visual.is_empty() {
                    log::error!("{}: update #{} is missing materials", self.label, generation);
                }
                None
            }
        };

        let half_width = dims.width / 2.0;
        let half_depth = dims.height / 2.0;
        if visual.is_empty() {
            self.bounds.remove_volume(VolumeKind::Body);
        } else {
            let height = layer_step * visual.card_count as f32;
            self.bounds
                .set_volume(VolumeKind::Body, Aabb::resting(half_width, height, half_depth));
        }
        // Halo ring sits outside the margin and is `halo_thickness` wide.
        let reach = self.config.halo_margin + self.config.halo_thickness;
        self.bounds.set_volume(
            VolumeKind::Halo,
            Aabb::resting(
                half_width + reach,
                self.config.halo_thickness,
                half_depth + reach,
            ),
        );

        self.applied = Some(AppliedState {
            generation,
            visual,
            keys,
            handles,
            geometry,
        });
    }

    fn report_failure(&mut self, generation: u64, error: ResourceLoadError) {
        let report = FailureReport {
            label: self.label.clone(),
            generation,
            error,
        };
        log::warn!("{report}");
        if let Some(observer) = self.observer.as_mut() {
            observer(&report);
        }
        self.last_failure = Some(report);
    }
}

impl fmt::Debug for StackEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackEntity")
            .field("label", &self.label)
            .field("cards", &self.cards.len())
            .field("generation", &self.generation)
            .field("pending", &self.pending_generation())
            .field("applied", &self.applied_generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::{AssetCatalog, AssetQuality};
    use cache::testing::ManualLoader;
    use renderer::HeadlessRenderer;

    fn setup() -> (ManualLoader, ResourceCache, Arc<TableConfig>) {
        let loader = ManualLoader::new();
        let cache = ResourceCache::new(
            loader.clone(),
            AssetCatalog::standard("public", AssetQuality::High),
        );
        (loader, cache, Arc::new(TableConfig::default()))
    }

    #[test]
    fn empty_stack_applies_without_mesh() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::deck("discard", CardKind::Tarot, Vec::new()),
            cache.clone(),
            config,
        );
        assert!(stack.is_locked());
        assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 1 });
        assert!(stack.geometry().is_none());
        assert!(stack.halo_visible());
        assert!(loader.calls().is_empty());
        assert_eq!(stack.tick(&mut renderer), TickOutcome::Idle);
    }

    #[test]
    fn pop_on_empty_reports_empty_even_when_locked() {
        let (_loader, cache, config) = setup();
        let mut stack = StackEntity::new(
            StackSpec::deck("discard", CardKind::Tarot, Vec::new()),
            cache,
            config,
        );
        assert_eq!(stack.pop(), Err(StackError::Empty));
        assert_eq!(stack.generation(), 1);
    }

    #[test]
    fn decorative_stack_loads_backs_only() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::decorative("shelf", CardKind::Tarot),
            cache.clone(),
            config,
        );
        loader.complete_all();
        assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 1 });
        assert_eq!(loader.calls().len(), 3);
        let geometry = stack.geometry().expect("mesh");
        assert_eq!(
            renderer.mesh(geometry).map(|m| m.triangle_count()),
            Some(70 * 12)
        );
        assert!(!stack.halo_visible());
    }

    #[test]
    fn single_card_flip_turns_the_card() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let card = CardInstance::tarot(5).with_face_down(true);
        let mut stack = StackEntity::new(StackSpec::single("card", card), cache, config);
        loader.complete_all();
        stack.tick(&mut renderer);
        assert_eq!(
            stack.applied_visual().map(|v| v.orientation),
            Some(Orientation::FaceDown)
        );

        stack.flip().expect("unlocked");
        stack.tick(&mut renderer);
        assert!(stack.top().is_some_and(|c| !c.face_down));
        assert_eq!(
            stack.applied_visual().map(|v| v.orientation),
            Some(Orientation::FaceUp)
        );
    }

    #[test]
    fn shuffle_is_skipped_while_locked() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let cards: Vec<_> = (0..10).map(CardInstance::tarot).collect();
        let mut stack = StackEntity::new(
            StackSpec::deck("deck", CardKind::Tarot, cards.clone()).with_seed(3),
            cache,
            config,
        );
        assert!(!stack.shuffle(2, true));
        assert_eq!(stack.cards(), cards.as_slice());

        loader.complete_all();
        stack.tick(&mut renderer);
        assert!(stack.shuffle(2, false));
        assert!(!stack.is_locked());
        assert!(stack.shuffle_default());
        assert!(stack.is_locked());
    }

    #[test]
    fn moving_the_stack_moves_its_geometry_and_bounds() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::single("card", CardInstance::tarot(0)),
            cache,
            config,
        );
        loader.complete_all();
        stack.tick(&mut renderer);

        let target = Vec3::new(2.0, 0.0, -1.0);
        stack.set_position(target, &mut renderer);
        let geometry = stack.geometry().expect("mesh");
        assert_eq!(renderer.node(geometry).map(|n| n.position), Some(target));

        let down = Ray::new(Vec3::new(2.0, 5.0, -1.0), -Vec3::Y);
        assert!(stack.hit_test(&down));
        let miss = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        assert!(!stack.hit_test(&miss));
    }

    #[test]
    fn pointing_at_the_halo_ring_hits() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::deck("deck", CardKind::Tarot, vec![CardInstance::tarot(2)]),
            cache,
            Arc::clone(&config),
        );
        loader.complete_all();
        stack.tick(&mut renderer);

        let ring = config.card_width / 2.0 + config.halo_margin + config.halo_thickness / 2.0;
        let through_ring = Ray::new(Vec3::new(ring, 5.0, 0.0), -Vec3::Y);
        assert!(stack.hit_test(&through_ring));
        let outside = ring + config.halo_thickness;
        assert!(!stack.hit_test(&Ray::new(Vec3::new(outside, 5.0, 0.0), -Vec3::Y)));
    }

    #[test]
    fn lone_card_in_a_deck_shows_its_own_side() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::deck(
                "deck",
                CardKind::Tarot,
                vec![CardInstance::tarot(4).with_face_down(false)],
            ),
            cache.clone(),
            Arc::clone(&config),
        );
        assert!(stack.is_face_down());
        loader.complete_all();
        stack.tick(&mut renderer);
        assert_eq!(
            stack.applied_visual().map(|v| v.orientation),
            Some(Orientation::FaceUp)
        );

        let mut pile = StackEntity::new(
            StackSpec::deck("pile", CardKind::Tarot, Vec::new()),
            cache,
            config,
        );
        pile.tick(&mut renderer);
        pile.push(CardInstance::tarot(9)).expect("unlocked");
        pile.push(CardInstance::tarot(10)).expect_err("locked until applied");
        loader.complete_all();
        pile.tick(&mut renderer);
        assert_eq!(
            pile.applied_visual().map(|v| v.orientation),
            Some(Orientation::FaceUp)
        );

        pile.push(CardInstance::tarot(10)).expect("unlocked");
        loader.complete_all();
        pile.tick(&mut renderer);
        assert_eq!(
            pile.applied_visual().map(|v| v.orientation),
            Some(Orientation::FaceDown)
        );
    }

    #[test]
    fn negative_jitter_limits_do_not_break_the_mesh() {
        let (loader, cache, _config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let config = TableConfig {
            max_offset: -0.01,
            max_yaw_deg: -2.0,
            ..TableConfig::default()
        };
        let cards: Vec<_> = (0..3).map(CardInstance::tarot).collect();
        let mut stack = StackEntity::new(
            StackSpec::deck("deck", CardKind::Tarot, cards),
            cache,
            Arc::new(config),
        );
        loader.complete_all();
        assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 1 });
        assert!(stack.geometry().is_some());
    }

    #[test]
    fn dispose_releases_everything() {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = StackEntity::new(
            StackSpec::single("card", CardInstance::tarot(0)),
            cache.clone(),
            config,
        );
        loader.complete_all();
        stack.tick(&mut renderer);
        stack.flip().expect("unlocked");

        stack.dispose(&mut renderer);
        assert!(cache.is_empty());
        assert_eq!(renderer.live_geometry(), 0);
        assert_eq!(renderer.attached_count(), 0);
    }
}
