//! Deferred structural mutation: spec.md §5's change queue and `Commands` façade.
//!
//! Queries hand out pointers into component columns that stay valid for a
//! system's whole body (see [`crate::ecs::storage::column::ComponentColumn::get_ptr`]).
//! That guarantee only holds if nothing swap-removes a column entry while a
//! system is running, so `Commands::add_component` / `remove_component` /
//! `despawn` never touch storage directly — they queue a [`Command`] that
//! the scheduler applies with [`ChangeQueue::flush`] once the system
//! returns, in the order they were issued (`SegQueue` is FIFO).
//!
//! `Commands::spawn` is the one exception: it mutates the entity table
//! immediately. Allocating a fresh, componentless slot cannot move or drop
//! any value a query is currently pointing at, so there is nothing to
//! defer — and a caller needs the `Entity` back synchronously to attach
//! components to it or link it as a parent later in the same system.
//! Because of that synchronous contract, `Commands::spawn` always behaves
//! as `OverflowPolicy::Crash` on overflow: applying `OverwriteLast`/
//! `OverwriteFirst` mid-system would strip an existing entity's components
//! out from under any query currently iterating it.

use std::any::type_name;

use crossbeam::queue::SegQueue;

use crate::ecs::changes::ChangesList;
use crate::ecs::component::Component;
use crate::ecs::entity::{Entity, EntityTable};
use crate::ecs::registry::TypeRegistry;
use crate::ecs::storage::Storage;
use crate::error::Error;

enum Command {
    Mutate(Box<dyn FnOnce(&mut Storage, &mut ChangesList) + 'static>),
    RemoveEntity(Entity),
}

/// FIFO queue of deferred structural mutations, drained between systems.
#[derive(Default)]
pub struct ChangeQueue {
    queue: SegQueue<Command>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push(&self, command: Command) {
        self.queue.push(command);
    }

    /// Apply every queued command to `storage`, in the order they were
    /// issued, logging each one to `changes` (spec.md §3, §4.4). Called once
    /// after every system runs (spec.md §6's `post_system_update`), not once
    /// per stage or per frame.
    pub fn flush(&self, storage: &mut Storage, changes: &mut ChangesList) {
        while let Some(command) = self.queue.pop() {
            match command {
                Command::Mutate(apply) => apply(storage, changes),
                Command::RemoveEntity(entity) => {
                    if !storage.despawn_cascade(entity, changes) {
                        log::warn!(
                            "Commands::despawn: entity {entity:?} was already removed before this flush"
                        );
                    }
                }
            }
        }
    }
}

/// The in-system handle for queuing structural mutation and making
/// synchronous, read-only queries against already-committed state.
pub struct Commands<'w> {
    storage: &'w Storage,
    entities: *mut EntityTable,
    registry: &'w TypeRegistry,
    queue: &'w ChangeQueue,
    changes: *mut ChangesList,
}

impl<'w> Commands<'w> {
    /// # Safety
    /// `entities` must point to the same `EntityTable` backing `storage`,
    /// and `changes` to the same `ChangesList` the scheduler flushes this
    /// world's change queue into; both must stay valid and exclusively
    /// reachable through this `Commands` for `'w` (the scheduler holds
    /// `&mut World` for the duration of the system call that received this
    /// `Commands`).
    pub(crate) unsafe fn new(
        storage: &'w Storage,
        entities: *mut EntityTable,
        registry: &'w TypeRegistry,
        queue: &'w ChangeQueue,
        changes: *mut ChangesList,
    ) -> Self {
        Self {
            storage,
            entities,
            registry,
            queue,
            changes,
        }
    }

    /// Allocate a fresh, componentless entity immediately. See the module
    /// docs for why this does not go through the change queue.
    ///
    /// # Panics
    /// Panics if the world's `max_entities` population is already full.
    pub fn spawn(&self) -> Entity {
        // SAFETY: see `Commands::new`.
        let entities = unsafe { &mut *self.entities };
        let entity = entities.try_allocate_slot().unwrap_or_else(|| {
            panic!(
                "Commands::spawn: entity population is at max_entities ({}); \
                 only World::spawn (outside a running stage) honors overflow policies other than Crash",
                entities.max_entities()
            )
        });
        // SAFETY: see `Commands::new`.
        unsafe { (*self.changes).added_ent.push(entity) };
        entity
    }

    pub fn spawn_many(&self, count: u32) -> Vec<Entity> {
        (0..count).map(|_| self.spawn()).collect()
    }

    /// Queue `value` to be attached to `entity` at the next flush.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) -> Result<(), Error> {
        let slot = self.component_slot::<T>()?;
        self.queue.push(Command::Mutate(Box::new(move |storage, changes| {
            storage.add_component::<T>(entity, slot, value);
            changes.added_component.push((entity, slot));
        })));
        Ok(())
    }

    /// Queue `entity`'s `T` component (if any) to be removed at the next flush.
    pub fn remove_component<T: Component>(&self, entity: Entity) -> Result<(), Error> {
        let slot = self.component_slot::<T>()?;
        self.queue.push(Command::Mutate(Box::new(move |storage, changes| {
            if storage.remove_component::<T>(entity, slot).is_some() {
                changes.removed_component.push((entity, slot));
            } else {
                log::warn!(
                    "Commands::remove_component: entity {entity:?} had no {} to remove",
                    type_name::<T>()
                );
            }
        })));
        Ok(())
    }

    /// Queue `entity` and every component it owns to be removed at the next flush.
    pub fn despawn(&self, entity: Entity) {
        self.queue.push(Command::RemoveEntity(entity));
    }

    /// Synchronous read of committed state: never observes mutations queued
    /// earlier in the same system body (spec.md §5).
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        match self.registry.get_component::<T>() {
            Some(id) => self.storage.has_component(entity, id.index()),
            None => false,
        }
    }

    /// Synchronous read of committed state; see [`Commands::has_component`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&'w T> {
        let slot = self.registry.get_component::<T>()?.index();
        self.storage.get_component::<T>(entity, slot)
    }

    fn component_slot<T: Component>(&self) -> Result<usize, Error> {
        self.registry.require_component_slot::<T>()
    }
}
