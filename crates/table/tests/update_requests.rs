use std::sync::Arc;

use asset::{AssetCatalog, AssetQuality, CardKind, ResourceKey};
use cache::testing::ManualLoader;
use cache::{EntryStatus, ResourceCache};
use parking_lot::Mutex;
use proptest::prelude::*;
use renderer::{HeadlessRenderer, Orientation};
use table::{
    CardInstance, StackEntity, StackError, StackSpec, TableConfig, TickOutcome, VisualState,
};

fn setup() -> (ManualLoader, ResourceCache, Arc<TableConfig>) {
    let loader = ManualLoader::new();
    let cache = ResourceCache::new(
        loader.clone(),
        AssetCatalog::standard("public", AssetQuality::High),
    );
    (loader, cache, Arc::new(TableConfig::default()))
}

fn empty_deck(cache: &ResourceCache, config: &Arc<TableConfig>) -> StackEntity {
    StackEntity::new(
        StackSpec::deck("deck", CardKind::Tarot, Vec::new()),
        cache.clone(),
        Arc::clone(config),
    )
}

/// Settle every outstanding load, then tick until the stack is idle.
fn settle(loader: &ManualLoader, stack: &mut StackEntity, renderer: &mut HeadlessRenderer) {
    loader.complete_all();
    while stack.tick(&mut *renderer) != TickOutcome::Idle {}
}

#[test]
fn cold_cache_fool_scenario() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = empty_deck(&cache, &config);
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 1 });
    assert!(cache.is_empty());

    stack
        .push(CardInstance::tarot(0).with_face_down(true))
        .expect("unlocked");

    let face = ResourceKey::face("0_the_fool");
    let back = ResourceKey::back(CardKind::Tarot);
    let edge = ResourceKey::edge(CardKind::Tarot);
    for key in [&face, &back, &edge] {
        assert_eq!(cache.status(key), Some(EntryStatus::Loading), "{key}");
    }
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Waiting { generation: 2 });
    assert!(stack.geometry().is_none());

    loader.complete("0_the_fool.jpg");
    loader.complete("back.jpg");
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Waiting { generation: 2 });
    loader.complete("edge.jpg");
    loader.complete("paper_normal.jpg");
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 2 });

    let geometry = stack.geometry().expect("mesh for one card");
    assert_eq!(renderer.mesh(geometry).map(|m| m.triangle_count()), Some(12));
    assert!(renderer.is_attached(geometry));
    assert_eq!(
        stack.applied_visual(),
        Some(&VisualState {
            kind: CardKind::Tarot,
            top_face: Some("0_the_fool".to_string()),
            card_count: 1,
            orientation: Orientation::FaceDown,
        })
    );
    // The previous state was empty, so nothing else was released or built.
    assert_eq!(renderer.stats().released, 0);
    assert_eq!(cache.ref_count(&face), Some(1));
}

#[test]
fn mutations_while_pending_are_rejected() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let cards = vec![CardInstance::tarot(3), CardInstance::tarot(4)];
    let mut stack = StackEntity::new(
        StackSpec::deck("deck", CardKind::Tarot, cards.clone()),
        cache,
        config,
    );

    assert_eq!(
        stack.push(CardInstance::tarot(9)),
        Err(StackError::Locked { generation: 1 })
    );
    assert_eq!(stack.pop(), Err(StackError::Locked { generation: 1 }));
    assert_eq!(stack.flip(), Err(StackError::Locked { generation: 1 }));
    assert!(!stack.shuffle(3, true));
    assert_eq!(stack.cards(), cards.as_slice());
    assert_eq!(stack.generation(), 1);

    settle(&loader, &mut stack, &mut renderer);
    assert_eq!(stack.pop(), Ok(CardInstance::tarot(4)));
}

#[test]
fn pop_on_empty_issues_nothing() {
    let (_loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = empty_deck(&cache, &config);
    stack.tick(&mut renderer);

    assert_eq!(stack.pop(), Err(StackError::Empty));
    assert!(!stack.is_locked());
    assert_eq!(stack.generation(), 1);
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Idle);
}

#[test]
fn push_pop_round_trip_restores_refcounts() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = StackEntity::new(
        StackSpec::deck("deck", CardKind::Tarot, vec![CardInstance::tarot(7)]),
        cache.clone(),
        config,
    );
    settle(&loader, &mut stack, &mut renderer);

    let keys = [
        ResourceKey::face("7_the_chariot"),
        ResourceKey::back(CardKind::Tarot),
        ResourceKey::edge(CardKind::Tarot),
        ResourceKey::normal_map("paper"),
    ];
    let before: Vec<_> = keys.iter().map(|k| cache.ref_count(k)).collect();

    let card = CardInstance::tarot(21).with_face_down(true);
    stack.push(card).expect("unlocked");
    settle(&loader, &mut stack, &mut renderer);
    assert_eq!(cache.ref_count(&ResourceKey::face("21_the_world")), Some(1));

    assert_eq!(stack.pop(), Ok(card));
    settle(&loader, &mut stack, &mut renderer);

    let after: Vec<_> = keys.iter().map(|k| cache.ref_count(k)).collect();
    assert_eq!(before, after);
    assert!(!cache.contains(&ResourceKey::face("21_the_world")));
    assert_eq!(renderer.live_geometry(), 1);
}

#[test]
fn superseded_request_never_applies() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = StackEntity::new(
        StackSpec::deck("deck", CardKind::Tarot, vec![CardInstance::tarot(1)]),
        cache.clone(),
        config,
    );
    settle(&loader, &mut stack, &mut renderer);

    stack.push(CardInstance::tarot(2)).expect("unlocked");
    assert_eq!(stack.pending_generation(), Some(2));
    assert_eq!(stack.request_rebuild(), 3);

    loader.complete_all();
    assert_eq!(stack.tick(&mut renderer), TickOutcome::Applied { generation: 3 });
    assert_eq!(stack.applied_generation(), Some(3));
    // One reference from the applied state, none left over from #2.
    assert_eq!(cache.ref_count(&ResourceKey::face("2_the_high_priestess")), Some(1));
    assert_eq!(loader.load_count("2_the_high_priestess.jpg"), 1);
}

#[test]
fn failed_load_keeps_last_good_state_and_can_retry() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = StackEntity::new(
        StackSpec::deck("deck", CardKind::Tarot, vec![CardInstance::tarot(1)]),
        cache.clone(),
        config,
    );
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    stack.set_failure_observer(move |report| sink.lock().push(report.generation));
    settle(&loader, &mut stack, &mut renderer);
    let good = stack.geometry();

    stack.push(CardInstance::tarot(13)).expect("unlocked");
    loader.fail("13_death.jpg");
    let outcome = stack.tick(&mut renderer);
    assert!(matches!(outcome, TickOutcome::Failed { generation: 2, .. }));

    assert_eq!(stack.geometry(), good);
    assert_eq!(stack.applied_generation(), Some(1));
    assert_eq!(stack.last_failure().map(|f| f.generation), Some(2));
    assert_eq!(*reports.lock(), vec![2]);
    assert!(!stack.is_locked());
    assert!(!cache.contains(&ResourceKey::face("13_death")));

    stack.request_rebuild();
    assert_eq!(loader.load_count("13_death.jpg"), 2);
    settle(&loader, &mut stack, &mut renderer);
    assert_eq!(
        stack.applied_visual().and_then(|v| v.top_face.clone()),
        Some("13_death".to_string())
    );
}

#[test]
fn unknown_card_fails_without_loading() {
    let (loader, cache, config) = setup();
    let mut renderer = HeadlessRenderer::new();
    let mut stack = StackEntity::new(
        StackSpec::single("ghost", CardInstance::new(CardKind::Playing, 500)),
        cache.clone(),
        config,
    );
    loader.complete_all();
    assert!(matches!(
        stack.tick(&mut renderer),
        TickOutcome::Failed { generation: 1, .. }
    ));
    assert!(stack.geometry().is_none());
    assert!(loader.calls().iter().all(|p| !p.contains("#500")));
}

proptest! {
    #[test]
    fn applied_state_tracks_latest_push(
        faces in prop::collection::vec(0usize..78, 1..8),
        order_seed in any::<u64>(),
    ) {
        let (loader, cache, config) = setup();
        let mut renderer = HeadlessRenderer::new();
        let mut stack = empty_deck(&cache, &config);
        stack.tick(&mut renderer);

        let mut pending_order = order_seed;
        for &face in &faces {
            stack.push(CardInstance::tarot(face)).expect("unlocked");
            // Complete the outstanding loads one path at a time in a
            // seed-dependent order, ticking in between.
            loop {
                let pending = loader.pending();
                if pending.is_empty() {
                    break;
                }
                let pick = (pending_order % pending.len() as u64) as usize;
                pending_order = pending_order.rotate_left(7) ^ 0x5bd1_e995;
                loader.complete(&pending[pick]);
                let outcome = stack.tick(&mut renderer);
                let failed = matches!(outcome, TickOutcome::Failed { .. });
                prop_assert!(!failed);
            }
            while stack.tick(&mut renderer) != TickOutcome::Idle {}

            let expected = cache.catalog().face_name(CardKind::Tarot, face).map(str::to_string);
            prop_assert_eq!(stack.applied_visual().and_then(|v| v.top_face.clone()), expected);
            prop_assert_eq!(stack.applied_generation(), Some(stack.generation()));
        }

        prop_assert_eq!(renderer.live_geometry(), 1);
        prop_assert_eq!(renderer.attached_count(), 1);
        // Only the applied state holds references.
        for handle in stack.applied_handles() {
            prop_assert_eq!(cache.ref_count(handle.key()), Some(1));
        }
        prop_assert_eq!(cache.len(), stack.applied_handles().len());
    }
}
