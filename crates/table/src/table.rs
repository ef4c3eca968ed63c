//! The table: owns the shared cache and every stack on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use asset::CardKind;
use cache::ResourceCache;
use corelib::spatial::Ray;
use renderer::{RenderBackend, SceneGraph};

use crate::card::standard_deck;
use crate::config::TableConfig;
use crate::error::{ConfigError, TableError};
use crate::rng::TableRng;
use crate::stack::{StackEntity, StackSpec, TickOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

pub struct Table {
    cache: ResourceCache,
    config: Arc<TableConfig>,
    entities: BTreeMap<EntityId, StackEntity>,
    next_id: u32,
    rng: TableRng,
}

impl Table {
    /// Fails when `config` does not pass [`TableConfig::validate`].
    pub fn new(cache: ResourceCache, config: TableConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache,
            config: Arc::new(config),
            entities: BTreeMap::new(),
            next_id: 0,
            rng: TableRng::new(seed),
        })
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn spawn(&mut self, spec: StackSpec) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        let rng = self.rng.fork();
        log::debug!(
            "table: spawn {:?} '{}' ({} cards)",
            id,
            spec.label,
            spec.cards.len()
        );
        let entity =
            StackEntity::with_rng(spec, self.cache.clone(), Arc::clone(&self.config), rng);
        self.entities.insert(id, entity);
        id
    }

    /// A full, shuffled, face-down deck of `kind`.
    pub fn spawn_standard_deck(&mut self, label: &str, kind: CardKind) -> EntityId {
        let mut cards = standard_deck(self.cache.catalog(), kind);
        for _ in 0..self.config.shuffle_iterations {
            self.rng.shuffle(&mut cards);
        }
        self.spawn(StackSpec::deck(label, kind, cards))
    }

    pub fn entity(&self, id: EntityId) -> Option<&StackEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut StackEntity> {
        self.entities.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// One frame: drive orphaned loads, then advance every stack.
    pub fn tick<R>(&mut self, renderer: &mut R) -> Vec<(EntityId, TickOutcome)>
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        self.cache.pump();
        self.entities
            .iter_mut()
            .map(|(id, entity)| (*id, entity.tick(&mut *renderer)))
            .filter(|(_, outcome)| *outcome != TickOutcome::Idle)
            .collect()
    }

    /// Update hover flags from a picking ray. Returns the hovered entities.
    pub fn hover(&mut self, ray: &Ray) -> Vec<EntityId> {
        let mut hovered = Vec::new();
        for (id, entity) in &mut self.entities {
            let hit = entity.hit_test(ray);
            entity.set_hovered(hit);
            if hit {
                hovered.push(*id);
            }
        }
        hovered
    }

    /// Move the top card of `from` onto `to`. Both stacks must be unlocked;
    /// nothing changes when either is not.
    pub fn transfer_top(&mut self, from: EntityId, to: EntityId) -> Result<(), TableError> {
        if from == to {
            return Err(TableError::SameEntity(from));
        }
        let source = self.entities.get(&from).ok_or(TableError::UnknownEntity(from))?;
        let target = self.entities.get(&to).ok_or(TableError::UnknownEntity(to))?;
        if source.is_empty() {
            return Err(crate::error::StackError::Empty.into());
        }
        for stack in [source, target] {
            if let Some(generation) = stack.pending_generation() {
                return Err(crate::error::StackError::Locked { generation }.into());
            }
        }

        let card = self
            .entities
            .get_mut(&from)
            .ok_or(TableError::UnknownEntity(from))?
            .pop()?;
        self.entities
            .get_mut(&to)
            .ok_or(TableError::UnknownEntity(to))?
            .push(card)?;
        log::debug!("table: moved top card {:?} -> {:?}", from, to);
        Ok(())
    }

    pub fn despawn<R>(&mut self, id: EntityId, renderer: &mut R) -> Result<(), TableError>
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        let entity = self.entities.remove(&id).ok_or(TableError::UnknownEntity(id))?;
        entity.dispose(renderer);
        Ok(())
    }

    /// Remove every stack, giving back all references.
    pub fn clear<R>(&mut self, renderer: &mut R)
    where
        R: RenderBackend + SceneGraph + ?Sized,
    {
        for (_, entity) in std::mem::take(&mut self.entities) {
            entity.dispose(&mut *renderer);
        }
    }
}
