//! The changes list: spec.md §3's per-frame structural-delta log.
//!
//! Every entity spawn/despawn and component add/remove applied during a
//! frame — whether issued immediately through [`crate::ecs::world::World`]
//! or deferred through [`crate::ecs::commands::Commands`] and flushed by the
//! [`crate::ecs::commands::ChangeQueue`] — is appended here. It exists for
//! observability (a host can inspect what moved this frame) and is cleared
//! once per frame by [`crate::ecs::world::World::tick`], the same boundary
//! that clears event pools.

use crate::ecs::entity::Entity;

/// One frame's worth of structural deltas, in the order they were applied.
#[derive(Debug, Default)]
pub struct ChangesList {
    pub added_ent: Vec<Entity>,
    pub removed_ent: Vec<Entity>,
    /// `(entity, component_slot)` pairs.
    pub added_component: Vec<(Entity, usize)>,
    /// `(entity, component_slot)` pairs.
    pub removed_component: Vec<(Entity, usize)>,
}

impl ChangesList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.added_ent.is_empty()
            && self.removed_ent.is_empty()
            && self.added_component.is_empty()
            && self.removed_component.is_empty()
    }

    pub fn clear(&mut self) {
        self.added_ent.clear();
        self.removed_ent.clear();
        self.added_component.clear();
        self.removed_component.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::{EntityTable, OverflowPolicy};

    #[test]
    fn fresh_list_is_empty() {
        assert!(ChangesList::new().is_empty());
    }

    #[test]
    fn clear_empties_every_field() {
        let mut table = EntityTable::new(1, OverflowPolicy::Crash);
        let e = table.try_allocate_slot().unwrap();

        let mut changes = ChangesList::new();
        changes.added_ent.push(e);
        changes.added_component.push((e, 0));
        assert!(!changes.is_empty());

        changes.clear();
        assert!(changes.is_empty());
    }
}
