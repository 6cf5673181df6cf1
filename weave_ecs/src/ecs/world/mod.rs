//! The [`World`]: owns every piece of per-run state and drives the frame loop.
//!
//! `World` is deliberately `!Send` — see the `_not_send` field — because
//! [`crate::ecs::commands::Commands`] and `ResMut` fetch raw pointers out of
//! it that are only sound under the scheduler's single-threaded, one-system-
//! at-a-time execution model (spec.md's non-goal: no parallel execution
//! guarantee).

pub mod builder;

pub use builder::WorldBuilder;

use std::marker::PhantomData;

use crate::ecs::changes::ChangesList;
use crate::ecs::commands::ChangeQueue;
use crate::ecs::component::Component;
use crate::ecs::entity::{Entity, OverflowPolicy};
use crate::ecs::event::{Event, EventReader, EventStorage};
use crate::ecs::registry::TypeRegistry;
use crate::ecs::resource::Resource;
use crate::ecs::schedule::{Label, Schedule, Section};
use crate::ecs::storage::column::Hook;
use crate::ecs::storage::Storage;
use crate::ecs::system::IntoSystem;
use crate::error::{CrashReason, Error};

/// Default stage names the builder wires a fresh [`World`] to run, in order.
pub mod stages {
    pub const INIT: &str = "init";
    pub const LOAD: &str = "load";
    pub const PRE_UPDATE: &str = "pre_update";
    pub const UPDATE: &str = "update";
    pub const POST_UPDATE: &str = "post_update";
    pub const DRAW: &str = "draw";
    pub const DEINIT: &str = "deinit";
}

pub struct World {
    registry: TypeRegistry,
    storage: Storage,
    events: EventStorage,
    change_queue: ChangeQueue,
    changes: ChangesList,
    schedule: Schedule,
    on_crash: Box<dyn FnMut(CrashReason)>,
    _not_send: PhantomData<*const ()>,
}

impl World {
    pub(crate) fn new(
        max_entities: u32,
        overflow_policy: OverflowPolicy,
        on_crash: Box<dyn FnMut(CrashReason)>,
    ) -> Self {
        Self {
            registry: TypeRegistry::new(),
            storage: Storage::new(max_entities, overflow_policy),
            events: EventStorage::new(),
            change_queue: ChangeQueue::new(),
            changes: ChangesList::new(),
            schedule: Schedule::new(),
            on_crash,
            _not_send: PhantomData,
        }
    }

    // -- registration --------------------------------------------------

    pub fn register_component<T: Component>(&mut self) {
        let slot = self.registry.register_component::<T>().index();
        self.storage.ensure_column::<T>(slot);
    }

    pub fn register_resource<R: Resource>(&mut self) {
        self.registry.register_resource::<R>();
    }

    pub fn register_event<E: Event>(&mut self) {
        self.registry.register_event::<E>();
    }

    // -- entities --------------------------------------------------------

    /// Spawn a fresh, componentless entity, applying the configured overflow
    /// policy if the population is already at `max_entities`.
    pub fn spawn(&mut self) -> Entity {
        if let Some(entity) = self.storage.entities_mut().try_allocate_slot() {
            self.changes.added_ent.push(entity);
            return entity;
        }

        let max_entities = self.storage.entities().max_entities();
        match self.storage.entities().overflow_policy() {
            OverflowPolicy::Crash => {
                (self.on_crash)(CrashReason::EntityOverflow { max_entities });
                panic!(
                    "entity population exceeded max_entities ({max_entities}) under the Crash overflow policy"
                );
            }
            OverflowPolicy::OverwriteLast => {
                let victim = *self
                    .storage
                    .entities()
                    .dense()
                    .last()
                    .expect("max_entities is 0");
                log::warn!(
                    "entity population at max_entities ({max_entities}); reusing most recently spawned entity {victim:?}"
                );
                self.storage.strip_components(victim, &mut self.changes);
                victim
            }
            OverflowPolicy::OverwriteFirst => {
                let victim = *self
                    .storage
                    .entities()
                    .dense()
                    .first()
                    .expect("max_entities is 0");
                log::warn!(
                    "entity population at max_entities ({max_entities}); reusing first spawned entity {victim:?}"
                );
                self.storage.strip_components(victim, &mut self.changes);
                victim
            }
        }
    }

    pub fn spawn_many(&mut self, count: u32) -> Vec<Entity> {
        (0..count).map(|_| self.spawn()).collect()
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.storage.entities().is_live(entity)
    }

    /// Despawn `entity` and every descendant in its parent hierarchy.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.storage.despawn_cascade(entity, &mut self.changes)
    }

    pub fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) -> Result<(), Error> {
        if !self.storage.entities().is_live(entity) {
            return Err(Error::EntityMissing(entity));
        }
        if let Some(parent) = parent
            && !self.storage.entities().is_live(parent)
        {
            return Err(Error::ParentMissing(parent));
        }
        self.storage.entities_mut().set_parent(entity, parent);
        Ok(())
    }

    pub fn get_parent(&self, entity: Entity) -> Option<Entity> {
        self.storage.entities().get_parent(entity)
    }

    pub fn children_of(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.storage.entities().children_of(entity)
    }

    // -- components, immediate (outside a running system) ---------------

    /// Debug builds panic if `T` was never registered; release builds
    /// return [`Error::UnregisteredComponent`] (spec.md §7).
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<Option<T>, Error> {
        let slot = self.component_slot::<T>()?;
        let prev = self.storage.add_component(entity, slot, value);
        self.changes.added_component.push((entity, slot));
        Ok(prev)
    }

    /// See [`World::add_component`]'s debug/release distinction.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>, Error> {
        let slot = self.component_slot::<T>()?;
        let removed = self.storage.remove_component(entity, slot);
        if removed.is_some() {
            self.changes.removed_component.push((entity, slot));
        }
        Ok(removed)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let slot = self.registry.get_component::<T>()?.index();
        self.storage.get_component(entity, slot)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        match self.registry.get_component::<T>() {
            Some(id) => self.storage.has_component(entity, id.index()),
            None => false,
        }
    }

    /// Install `T`'s `on_added`/`on_removed` lifecycle hooks (spec.md §3,
    /// §6). `register_component::<T>` must be called first.
    pub fn set_component_hooks<T: Component>(
        &mut self,
        on_added: Option<Hook<T>>,
        on_removed: Option<Hook<T>>,
    ) -> Result<(), Error> {
        let slot = self.component_slot::<T>()?;
        self.storage.set_component_hooks(slot, on_added, on_removed);
        Ok(())
    }

    fn component_slot<T: Component>(&self) -> Result<usize, Error> {
        self.registry.require_component_slot::<T>()
    }

    // -- resources --------------------------------------------------------

    pub fn insert_resource<R: Resource>(&mut self, value: R) -> Option<R> {
        self.storage.resources_mut().insert(value)
    }

    pub fn resource<R: Resource>(&self) -> Option<&R> {
        self.storage.resources().get::<R>()
    }

    pub fn resource_mut<R: Resource>(&mut self) -> Option<&mut R> {
        self.storage.resources_mut().get_mut::<R>()
    }

    // -- events ------------------------------------------------------------

    pub fn publish_event<E: Event>(&mut self, event: E) {
        self.events.publish(event);
    }

    pub fn read_events<E: Event>(&mut self, reader: &mut EventReader<E>) -> &[E] {
        self.events.read(reader)
    }

    // -- schedule -----------------------------------------------------------

    pub fn add_system<L, P>(
        &mut self,
        stage: &'static str,
        label: L,
        section: Section,
        system: impl IntoSystem<P>,
    ) where
        L: Label,
    {
        self.schedule.add_system(stage, label, section, system);
    }

    /// Insert `label` before `anchor` in `stage`'s total ordering (spec.md
    /// §4.5); see [`crate::ecs::schedule::Schedule::add_label_before`].
    pub fn add_label_before(&mut self, stage: &'static str, label: &'static str, anchor: &'static str) {
        self.schedule.add_label_before(stage, label, anchor);
    }

    /// Insert `label` after `anchor`; see [`World::add_label_before`].
    pub fn add_label_after(&mut self, stage: &'static str, label: &'static str, anchor: &'static str) {
        self.schedule.add_label_after(stage, label, anchor);
    }

    /// Run one stage's systems, flushing the change queue after each.
    /// Stops at the first system error.
    pub fn run_stage(&mut self, stage: &'static str) -> Result<(), Error> {
        let mut schedule = std::mem::take(&mut self.schedule);
        let result = schedule.run_stage(stage, self);
        self.schedule = schedule;
        result
    }

    /// Run one stage's systems, logging and continuing past individual
    /// errors or panics instead of stopping.
    pub fn run_stage_catch(&mut self, stage: &'static str) -> Vec<Error> {
        let mut schedule = std::mem::take(&mut self.schedule);
        let errors = schedule.run_stage_catch(stage, self);
        self.schedule = schedule;
        errors
    }

    /// Apply every queued `Commands` mutation. Called by the scheduler after
    /// every system; exposed so host code driving systems by hand can do
    /// the same.
    pub fn flush_changes(&mut self) {
        self.change_queue.flush(&mut self.storage, &mut self.changes);
    }

    /// Run the `init` stage once, typically before the first [`World::tick`].
    pub fn init(&mut self) -> Result<(), Error> {
        self.run_stage(stages::INIT)
    }

    /// Run `load`, `pre_update`, `update`, `post_update`, and `draw` in
    /// order, then clear every event pool and the changes list for the next
    /// frame (spec.md §4.4's frame boundary). Stops at the first stage to
    /// return an error, still clearing afterward.
    pub fn tick(&mut self) -> Result<(), Error> {
        let result = self
            .run_stage(stages::LOAD)
            .and_then(|_| self.run_stage(stages::PRE_UPDATE))
            .and_then(|_| self.run_stage(stages::UPDATE))
            .and_then(|_| self.run_stage(stages::POST_UPDATE))
            .and_then(|_| self.run_stage(stages::DRAW));
        self.events.clean_for_next_frame();
        self.changes.clear();
        result
    }

    /// Run the `deinit` stage, logging (never propagating) any system error.
    pub fn deinit(&mut self) {
        for error in self.run_stage_catch(stages::DEINIT) {
            log::error!("deinit system failed: {error}");
        }
    }

    // -- escape hatches for system params and host code --------------------

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventStorage {
        &self.events
    }

    /// This frame's structural-delta log (spec.md §3); empty right after
    /// [`World::tick`] clears it.
    pub fn changes(&self) -> &ChangesList {
        &self.changes
    }

    pub(crate) fn change_queue(&self) -> &ChangeQueue {
        &self.change_queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        WorldBuilder::new().max_entities(4).build()
    }

    #[test]
    fn spawn_despawn_round_trip() {
        let mut world = world();
        let e = world.spawn();
        assert!(world.is_live(e));
        assert!(world.despawn(e));
        assert!(!world.is_live(e));
    }

    #[test]
    fn add_and_get_component() {
        struct Position(f32);
        impl Component for Position {}

        let mut world = world();
        world.register_component::<Position>();
        let e = world.spawn();
        world.add_component(e, Position(3.0)).unwrap();

        assert!(world.has_component::<Position>(e));
        assert_eq!(world.get_component::<Position>(e).unwrap().0, 3.0);
        assert_eq!(world.changes().added_component.len(), 1);
    }

    #[test]
    fn despawn_cascades_to_children() {
        let mut world = world();
        let root = world.spawn();
        let child = world.spawn();
        world.set_parent(child, Some(root)).unwrap();

        world.despawn(root);

        assert!(!world.is_live(root));
        assert!(!world.is_live(child));
    }

    #[test]
    fn set_parent_rejects_a_missing_parent() {
        let mut world = world();
        let e = world.spawn();
        let ghost = world.spawn();
        world.despawn(ghost);

        let result = world.set_parent(e, Some(ghost));
        assert!(matches!(result, Err(Error::ParentMissing(_))));
    }

    #[test]
    fn overwrite_last_policy_reuses_the_most_recent_entity_at_capacity() {
        let mut world = WorldBuilder::new()
            .max_entities(2)
            .overflow_policy(OverflowPolicy::OverwriteLast)
            .build();
        let first = world.spawn();
        let second = world.spawn();
        let third = world.spawn();

        assert_eq!(third, second);
        assert!(world.is_live(first));
        assert!(world.is_live(second));
    }

    #[test]
    fn despawn_fires_on_removed_once_per_component_including_descendants() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Position(f32);
        impl Component for Position {}

        let removed: Rc<RefCell<Vec<Entity>>> = Rc::new(RefCell::new(Vec::new()));

        let mut world = world();
        world.register_component::<Position>();
        world
            .set_component_hooks::<Position>(
                None,
                Some({
                    let removed = removed.clone();
                    Box::new(move |_value: &Position, entity| removed.borrow_mut().push(entity))
                }),
            )
            .unwrap();

        let root = world.spawn();
        let child = world.spawn();
        world.add_component(root, Position(0.0)).unwrap();
        world.add_component(child, Position(1.0)).unwrap();
        world.set_parent(child, Some(root)).unwrap();

        world.despawn(root);

        let removed = removed.borrow();
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&root));
        assert!(removed.contains(&child));
        assert_eq!(world.changes().removed_ent.len(), 2);
    }

    #[test]
    fn events_round_trip_and_clear_only_on_tick() {
        struct Hit;
        impl Event for Hit {}

        let mut world = world();
        world.register_event::<Hit>();
        world.publish_event(Hit);

        let mut reader = EventReader::<Hit>::new();
        assert_eq!(world.read_events(&mut reader).len(), 1);

        world.tick().unwrap();
        assert!(world.read_events(&mut reader).is_empty());
    }
}
