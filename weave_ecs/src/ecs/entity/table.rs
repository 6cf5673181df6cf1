//! The dense entity table: spec.md §4.2.
//!
//! Owns entity slot allocation (bounded by `max_entities`), the dense
//! live-entity list, parent links, and the per-entity component mask. This
//! type knows nothing about component *storage* — [`crate::ecs::storage`]
//! coordinates column membership with the mask bits kept here so that
//! `mask_of[e]` bit `c` is set iff `column[c].contains(e)` (spec.md §3
//! EntityTable invariant).

use fixedbitset::FixedBitSet;

use crate::ecs::entity::{Entity, Generation, Id};

/// What happens when `allocate` is called with the population already at `max_entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// The world crashes: `on_crash` is invoked and the process terminates.
    Crash,
    /// The most recently spawned entity is stripped of all components and its id reused.
    OverwriteLast,
    /// The very first spawned-and-still-live entity is stripped and reused.
    OverwriteFirst,
}

#[derive(Debug)]
pub struct EntityTable {
    max_entities: u32,
    overflow_policy: OverflowPolicy,

    /// Live entities, in insertion order; reordered by swap-remove on `free`.
    dense: Vec<Entity>,
    /// `index_of[id] = Some(pos in dense)`, or `None` if the slot is free.
    index_of: Vec<Option<u32>>,
    /// The generation currently assigned to each slot.
    generation_of: Vec<Generation>,
    /// `parent_of[id]` is this entity's parent, if any.
    parent_of: Vec<Option<Entity>>,
    /// `mask_of[id]` has bit `c` set iff the entity owns component slot `c`.
    mask_of: Vec<FixedBitSet>,

    /// The next slot to probe when allocating (wraps at `max_entities`).
    cursor: u32,
}

impl EntityTable {
    pub fn new(max_entities: u32, overflow_policy: OverflowPolicy) -> Self {
        assert!(max_entities > 0, "max_entities must be greater than 0");
        let cap = max_entities as usize;
        Self {
            max_entities,
            overflow_policy,
            dense: Vec::new(),
            index_of: vec![None; cap],
            generation_of: vec![Generation::FIRST; cap],
            parent_of: vec![None; cap],
            mask_of: vec![FixedBitSet::new(); cap],
            cursor: 0,
        }
    }

    #[inline]
    pub fn max_entities(&self) -> u32 {
        self.max_entities
    }

    #[inline]
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.dense.len()
    }

    /// The live entities, in their current (swap-remove-reordered) dense order.
    #[inline]
    pub fn dense(&self) -> &[Entity] {
        &self.dense
    }

    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        let idx = entity.index();
        idx < self.index_of.len()
            && self.index_of[idx].is_some()
            && self.generation_of[idx] == entity.generation()
    }

    /// Try to claim a free slot without applying the overflow policy.
    ///
    /// Probes starting at the internal cursor and wraps once around the full
    /// `[0, max_entities)` range; returns `None` only once every slot is live.
    pub fn try_allocate_slot(&mut self) -> Option<Entity> {
        if self.live_count() as u32 >= self.max_entities {
            return None;
        }
        for _ in 0..self.max_entities {
            let candidate = self.cursor;
            self.cursor = (self.cursor + 1) % self.max_entities;
            let idx = candidate as usize;
            if self.index_of[idx].is_none() {
                let entity = Entity::new(Id::new(candidate), self.generation_of[idx]);
                self.index_of[idx] = Some(self.dense.len() as u32);
                self.dense.push(entity);
                return Some(entity);
            }
        }
        None
    }

    /// Remove `entity` from the table: swap-remove from the dense list, clear
    /// its parent link and mask, and bump its slot's generation so stale
    /// handles are rejected by [`Self::is_live`]. No-op if `entity` is not live.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_live(entity) {
            return false;
        }
        let idx = entity.index();
        let pos = self.index_of[idx].take().unwrap() as usize;
        let last = self.dense.len() - 1;
        if pos != last {
            self.dense.swap(pos, last);
            let moved = self.dense[pos];
            self.index_of[moved.index()] = Some(pos as u32);
        }
        self.dense.pop();
        self.parent_of[idx] = None;
        self.mask_of[idx].clear();
        self.generation_of[idx] = self.generation_of[idx].next();
        true
    }

    /// Clear local bookkeeping (mask, parent) for an entity that is being
    /// reused in place under an overwrite overflow policy. Unlike [`Self::free`],
    /// the entity stays in the dense list at its current position and keeps
    /// its current generation: spec.md's overflow scenario returns the exact
    /// same `Entity` value, not a newly-generationed one.
    pub fn strip_local(&mut self, entity: Entity) {
        let idx = entity.index();
        self.parent_of[idx] = None;
        self.mask_of[idx].clear();
    }

    /// Grow every mask to hold at least `component_count` bits. Called by
    /// storage whenever a new component type is registered.
    pub fn ensure_component_capacity(&mut self, component_count: usize) {
        for mask in &mut self.mask_of {
            if mask.len() < component_count {
                mask.grow(component_count);
            }
        }
    }

    pub fn mask_set(&mut self, entity: Entity, component_slot: usize) {
        self.mask_of[entity.index()].insert(component_slot);
    }

    pub fn mask_clear(&mut self, entity: Entity, component_slot: usize) {
        self.mask_of[entity.index()].set(component_slot, false);
    }

    pub fn mask_contains(&self, entity: Entity, component_slot: usize) -> bool {
        self.mask_of[entity.index()].contains(component_slot)
    }

    pub fn mask_of(&self, entity: Entity) -> &FixedBitSet {
        &self.mask_of[entity.index()]
    }

    /// Set `entity`'s parent. `None` clears the link (roots the entity).
    ///
    /// # Panics
    /// Panics (programmer error, not in spec.md's `Error` taxonomy) if
    /// setting this link would create a cycle in the parent hierarchy.
    pub fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) {
        if let Some(parent) = parent {
            let mut walker = Some(parent);
            while let Some(ancestor) = walker {
                assert!(
                    ancestor != entity,
                    "set_parent would create a cycle in the parent hierarchy"
                );
                walker = self.parent_of[ancestor.index()];
            }
        }
        self.parent_of[entity.index()] = parent;
    }

    pub fn get_parent(&self, entity: Entity) -> Option<Entity> {
        self.parent_of[entity.index()]
    }

    /// Entities whose parent is `entity`. O(E) scan, per spec.md §9's
    /// accepted cost for frame-scale worlds.
    pub fn children_of(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.dense
            .iter()
            .copied()
            .filter(move |&e| self.parent_of[e.index()] == Some(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_then_free_frees_the_slot() {
        let mut table = EntityTable::new(4, OverflowPolicy::Crash);
        let e1 = table.try_allocate_slot().unwrap();
        assert!(table.is_live(e1));

        assert!(table.free(e1));
        assert!(!table.is_live(e1));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn free_bumps_generation_so_stale_handle_is_rejected() {
        let mut table = EntityTable::new(4, OverflowPolicy::Crash);
        let e1 = table.try_allocate_slot().unwrap();
        table.free(e1);

        let e2 = table.try_allocate_slot().unwrap();
        assert_eq!(e1.id(), e2.id());
        assert_ne!(e1.generation(), e2.generation());
        assert!(!table.is_live(e1));
        assert!(table.is_live(e2));
    }

    #[test]
    fn despawn_swaps_dense_and_updates_moved_entity_index() {
        let mut table = EntityTable::new(4, OverflowPolicy::Crash);
        let e1 = table.try_allocate_slot().unwrap();
        let e2 = table.try_allocate_slot().unwrap();
        let e3 = table.try_allocate_slot().unwrap();

        table.free(e1);

        assert_eq!(table.dense().len(), 2);
        assert!(table.dense().contains(&e2));
        assert!(table.dense().contains(&e3));
    }

    #[test]
    fn allocation_exhausts_at_max_entities() {
        let mut table = EntityTable::new(2, OverflowPolicy::Crash);
        assert!(table.try_allocate_slot().is_some());
        assert!(table.try_allocate_slot().is_some());
        assert!(table.try_allocate_slot().is_none());
    }

    #[test]
    fn mask_round_trip() {
        let mut table = EntityTable::new(2, OverflowPolicy::Crash);
        table.ensure_component_capacity(3);
        let e = table.try_allocate_slot().unwrap();

        assert!(!table.mask_contains(e, 1));
        table.mask_set(e, 1);
        assert!(table.mask_contains(e, 1));
        table.mask_clear(e, 1);
        assert!(!table.mask_contains(e, 1));
    }

    #[test]
    fn children_of_scans_parent_links() {
        let mut table = EntityTable::new(4, OverflowPolicy::Crash);
        let root = table.try_allocate_slot().unwrap();
        let child1 = table.try_allocate_slot().unwrap();
        let child2 = table.try_allocate_slot().unwrap();
        table.set_parent(child1, Some(root));
        table.set_parent(child2, Some(root));

        let mut children: Vec<_> = table.children_of(root).collect();
        children.sort();
        let mut expected = vec![child1, child2];
        expected.sort();
        assert_eq!(children, expected);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn set_parent_rejects_cycles() {
        let mut table = EntityTable::new(4, OverflowPolicy::Crash);
        let a = table.try_allocate_slot().unwrap();
        let b = table.try_allocate_slot().unwrap();
        table.set_parent(b, Some(a));
        table.set_parent(a, Some(b));
    }

    #[test]
    fn strip_local_keeps_entity_live_but_clears_bookkeeping() {
        let mut table = EntityTable::new(2, OverflowPolicy::OverwriteLast);
        table.ensure_component_capacity(1);
        let e = table.try_allocate_slot().unwrap();
        table.mask_set(e, 0);
        let parent = table.try_allocate_slot().unwrap();
        table.set_parent(e, Some(parent));

        table.strip_local(e);

        assert!(table.is_live(e));
        assert!(!table.mask_contains(e, 0));
        assert_eq!(table.get_parent(e), None);
    }
}
