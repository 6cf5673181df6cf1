//! Sparse-set component storage tying columns to the entity table.
//!
//! [`Storage`] is the home of every [`column::ComponentColumn`] (indexed by
//! the registry's dense `component_slot`) and the [`resources::ResourceStorage`].
//! It does not know about the change queue, events, or the schedule — those
//! live on [`crate::ecs::world::World`], which is also where the
//! entity-population overflow policy is actually applied (it needs the
//! `on_crash` callback, which `Storage` has no business owning).

pub mod column;
pub mod resources;

use column::{ComponentColumn, ErasedColumn, Hook};
use resources::ResourceStorage;

use crate::ecs::changes::ChangesList;
use crate::ecs::component::Component;
use crate::ecs::entity::{Entity, EntityTable, OverflowPolicy};

pub struct Storage {
    entities: EntityTable,
    /// Indexed by component slot; `None` until that slot's column is created.
    columns: Vec<Option<Box<dyn ErasedColumn>>>,
    resources: ResourceStorage,
    max_entities: u32,
}

impl Storage {
    pub fn new(max_entities: u32, overflow_policy: OverflowPolicy) -> Self {
        Self {
            entities: EntityTable::new(max_entities, overflow_policy),
            columns: Vec::new(),
            resources: ResourceStorage::new(),
            max_entities,
        }
    }

    #[inline]
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    #[inline]
    pub fn entities_mut(&mut self) -> &mut EntityTable {
        &mut self.entities
    }

    #[inline]
    pub fn resources(&self) -> &ResourceStorage {
        &self.resources
    }

    #[inline]
    pub fn resources_mut(&mut self) -> &mut ResourceStorage {
        &mut self.resources
    }

    /// Lazily create the column for a newly-registered component type and
    /// grow every entity's mask to cover it.
    pub fn ensure_column<T: Component>(&mut self, slot: usize) {
        if slot >= self.columns.len() {
            self.columns.resize_with(slot + 1, || None);
        }
        if self.columns[slot].is_none() {
            self.columns[slot] = Some(Box::new(ComponentColumn::<T>::new(self.max_entities)));
        }
        self.entities.ensure_component_capacity(slot + 1);
    }

    /// Type-erased access to the column at `slot`, for the query engine's
    /// driver-selection and membership tests.
    pub(crate) fn erased_column(&self, slot: usize) -> Option<&dyn ErasedColumn> {
        self.columns.get(slot)?.as_deref()
    }

    /// Typed access to the column at `slot`. Exposed crate-wide so the query
    /// engine can fetch component data once it has resolved slots through
    /// the type registry.
    pub(crate) fn column<T: Component>(&self, slot: usize) -> Option<&ComponentColumn<T>> {
        self.columns
            .get(slot)?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentColumn<T>>()
    }

    pub(crate) fn column_mut<T: Component>(
        &mut self,
        slot: usize,
    ) -> Option<&mut ComponentColumn<T>> {
        self.columns
            .get_mut(slot)?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentColumn<T>>()
    }

    /// Attach `value` to `entity` in the column for slot `slot`, setting the
    /// entity's mask bit. Returns the previous value, if any.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        slot: usize,
        value: T,
    ) -> Option<T> {
        let prev = self
            .column_mut::<T>(slot)
            .expect("ensure_column must be called before add_component")
            .assign(entity, value);
        self.entities.mask_set(entity, slot);
        prev
    }

    /// Detach `entity`'s value from slot `slot`, clearing the mask bit.
    pub fn remove_component<T: Component>(&mut self, entity: Entity, slot: usize) -> Option<T> {
        let removed = self.column_mut::<T>(slot).and_then(|c| c.remove(entity));
        if removed.is_some() {
            self.entities.mask_clear(entity, slot);
        }
        removed
    }

    pub fn get_component<T: Component>(&self, entity: Entity, slot: usize) -> Option<&T> {
        self.column::<T>(slot)?.get(entity)
    }

    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
        slot: usize,
    ) -> Option<&mut T> {
        self.column_mut::<T>(slot)?.get_mut(entity)
    }

    pub fn has_component(&self, entity: Entity, slot: usize) -> bool {
        self.entities.mask_contains(entity, slot)
    }

    pub fn column_len<T: Component>(&self, slot: usize) -> usize {
        self.column::<T>(slot).map(|c| c.len()).unwrap_or(0)
    }

    /// Install this component type's `on_added`/`on_removed` hooks
    /// (spec.md §3, §6). `ensure_column::<T>` must have run first.
    pub fn set_component_hooks<T: Component>(
        &mut self,
        slot: usize,
        on_added: Option<Hook<T>>,
        on_removed: Option<Hook<T>>,
    ) {
        self.column_mut::<T>(slot)
            .expect("ensure_column must be called before set_component_hooks")
            .set_hooks(on_added, on_removed);
    }

    /// Remove `entity` from every column whose mask bit it has set, without
    /// needing to know those columns' concrete types. Used by despawn and by
    /// the overflow-policy reuse path, both of which only have a mask to go on.
    /// Each stripped slot is logged to `changes` (spec.md §3) — `Storage`
    /// doesn't own a `ChangesList`, only appends to the one its caller holds.
    pub fn strip_components(&mut self, entity: Entity, changes: &mut ChangesList) {
        let slots: Vec<usize> = self
            .entities
            .mask_of(entity)
            .ones()
            .collect();
        for slot in slots {
            if let Some(Some(column)) = self.columns.get_mut(slot) {
                column.remove_erased(entity);
                changes.removed_component.push((entity, slot));
            }
        }
        self.entities.strip_local(entity);
    }

    /// Despawn `entity`: strip every component then free its slot.
    pub fn despawn(&mut self, entity: Entity, changes: &mut ChangesList) -> bool {
        if !self.entities.is_live(entity) {
            return false;
        }
        self.strip_components(entity, changes);
        let freed = self.entities.free(entity);
        if freed {
            changes.removed_ent.push(entity);
        }
        freed
    }

    /// Despawn `entity` and, recursively, every descendant in its parent
    /// hierarchy (spec.md §4.3's hierarchy-despawn scenario).
    pub fn despawn_cascade(&mut self, entity: Entity, changes: &mut ChangesList) -> bool {
        if !self.entities.is_live(entity) {
            return false;
        }
        let children: Vec<Entity> = self.entities.children_of(entity).collect();
        for child in children {
            self.despawn_cascade(child, changes);
        }
        self.despawn(entity, changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position(f32, f32);
    impl Component for Position {}
    struct Velocity(f32);
    impl Component for Velocity {}

    #[test]
    fn add_then_get_component_round_trips() {
        let mut storage = Storage::new(4, OverflowPolicy::Crash);
        storage.ensure_column::<Position>(0);
        let e = storage.entities_mut().try_allocate_slot().unwrap();

        storage.add_component(e, 0, Position(1.0, 2.0));
        assert!(storage.has_component(e, 0));
        let pos = storage.get_component::<Position>(e, 0).unwrap();
        assert_eq!((pos.0, pos.1), (1.0, 2.0));
    }

    #[test]
    fn remove_component_clears_mask() {
        let mut storage = Storage::new(4, OverflowPolicy::Crash);
        storage.ensure_column::<Position>(0);
        let e = storage.entities_mut().try_allocate_slot().unwrap();
        storage.add_component(e, 0, Position(0.0, 0.0));

        let removed = storage.remove_component::<Position>(e, 0);
        assert!(removed.is_some());
        assert!(!storage.has_component(e, 0));
    }

    #[test]
    fn despawn_strips_every_component_column() {
        let mut storage = Storage::new(4, OverflowPolicy::Crash);
        storage.ensure_column::<Position>(0);
        storage.ensure_column::<Velocity>(1);
        let e = storage.entities_mut().try_allocate_slot().unwrap();
        storage.add_component(e, 0, Position(0.0, 0.0));
        storage.add_component(e, 1, Velocity(1.0));

        let mut changes = ChangesList::new();
        assert!(storage.despawn(e, &mut changes));
        assert_eq!(storage.column_len::<Position>(0), 0);
        assert_eq!(storage.column_len::<Velocity>(1), 0);
        assert!(!storage.entities().is_live(e));
        assert_eq!(changes.removed_ent, vec![e]);
        assert_eq!(changes.removed_component.len(), 2);
    }

    #[test]
    fn despawn_cascade_removes_descendants() {
        let mut storage = Storage::new(4, OverflowPolicy::Crash);
        let root = storage.entities_mut().try_allocate_slot().unwrap();
        let child = storage.entities_mut().try_allocate_slot().unwrap();
        let grandchild = storage.entities_mut().try_allocate_slot().unwrap();
        storage.entities_mut().set_parent(child, Some(root));
        storage.entities_mut().set_parent(grandchild, Some(child));

        let mut changes = ChangesList::new();
        assert!(storage.despawn_cascade(root, &mut changes));

        assert!(!storage.entities().is_live(root));
        assert!(!storage.entities().is_live(child));
        assert!(!storage.entities().is_live(grandchild));
        assert_eq!(changes.removed_ent.len(), 3);
    }

    #[test]
    fn strip_components_keeps_entity_live_for_overflow_reuse() {
        let mut storage = Storage::new(2, OverflowPolicy::OverwriteLast);
        storage.ensure_column::<Position>(0);
        let e = storage.entities_mut().try_allocate_slot().unwrap();
        storage.add_component(e, 0, Position(1.0, 1.0));

        let mut changes = ChangesList::new();
        storage.strip_components(e, &mut changes);

        assert!(storage.entities().is_live(e));
        assert!(!storage.has_component(e, 0));
        assert_eq!(storage.column_len::<Position>(0), 0);
        assert_eq!(changes.removed_component, vec![(e, 0)]);
    }
}
