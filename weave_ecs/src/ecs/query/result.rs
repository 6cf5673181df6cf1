//! Driver-column iteration and duplicate/conflicting-role detection.
//!
//! A query's candidate set is found by scanning the smallest column among
//! its required and `With` slots (the "driver" column) and testing every
//! other required/with/without slot against each candidate's mask, rather
//! than intersecting every column up front. This keeps the common case —
//! one rare required component plus a couple of cheap filters — close to
//! O(size of the rarest column) instead of O(size of the whole world).

use std::marker::PhantomData;

use crate::ecs::entity::Entity;
use crate::ecs::storage::Storage;
use crate::error::Error;

use super::data::QueryFilter;
use super::param::QueryData;

/// Resolved, order-stable slot plan for one query instantiation.
pub(super) struct Plan {
    /// `(slot, optional)` pairs, in the data tuple's declared order — the
    /// order `QueryData::fetch` expects them back in.
    pub data_slots: Vec<(usize, bool)>,
    /// Slots that must be present: required data fields plus `With<T>` filters.
    pub positive: Vec<usize>,
    /// Slots that must be absent: `Without<T>` filters.
    pub negative: Vec<usize>,
}

impl Plan {
    pub fn resolve<D: QueryData, F: QueryFilter>(
        registry: &crate::ecs::registry::TypeRegistry,
    ) -> Result<Self, Error> {
        let data_shape = D::shape(registry)?;
        let filter_shape = F::shape(registry)?;

        // A slot may only appear once in the data shape, required or
        // optional — `(Write<Position>, Option<Write<Position>>)` would
        // otherwise have `D::fetch` hand out two live `&mut Position`
        // aliases for the same entity (spec.md §4.3, §7's `DuplicateQueryType`).
        let mut seen = std::collections::HashSet::new();
        for &(slot, _optional) in &data_shape.slots {
            if !seen.insert(slot) {
                panic!(
                    "query declares component slot {slot} more than once across its data fields \
                     (required and optional for the same slot are mutually exclusive)"
                );
            }
        }

        let mut positive = std::collections::HashSet::new();
        let mut negative = std::collections::HashSet::new();
        for &(slot, optional) in &data_shape.slots {
            if !optional {
                positive.insert(slot);
            }
        }
        for &(slot, is_with) in &filter_shape.slots {
            if is_with {
                positive.insert(slot);
            } else {
                negative.insert(slot);
            }
        }

        let conflicts: Vec<usize> = positive.intersection(&negative).copied().collect();
        assert!(
            conflicts.is_empty(),
            "query requires and excludes component slot(s) {conflicts:?} at the same time (required and excludes are mutually exclusive)"
        );

        Ok(Plan {
            data_slots: data_shape.slots,
            positive: positive.into_iter().collect(),
            negative: negative.into_iter().collect(),
        })
    }

    /// The driver column: whichever positive slot has the fewest entities.
    /// `None` means every data field is optional and there are no `With`
    /// filters, so the whole entity table is the candidate set.
    fn driver(&self, storage: &Storage) -> Option<usize> {
        self.positive
            .iter()
            .copied()
            .min_by_key(|&slot| {
                storage
                    .erased_column(slot)
                    .map(|c| c.len_erased())
                    .unwrap_or(0)
            })
    }

    fn candidate_source<'w>(&self, storage: &'w Storage) -> &'w [Entity] {
        match self.driver(storage) {
            Some(slot) => storage
                .erased_column(slot)
                .map(|c| c.entities_erased())
                .unwrap_or(&[]),
            None => storage.entities().dense(),
        }
    }

    fn passes(&self, storage: &Storage, entity: Entity) -> bool {
        self.positive
            .iter()
            .all(|&slot| storage.has_component(entity, slot))
            && self
                .negative
                .iter()
                .all(|&slot| !storage.has_component(entity, slot))
    }

    pub fn candidates(&self, storage: &Storage) -> Vec<Entity> {
        self.candidate_source(storage)
            .iter()
            .copied()
            .filter(|&e| self.passes(storage, e))
            .collect()
    }
}

/// Lazily fetches each matching entity's data on demand as the iterator is
/// driven; the candidate list itself (the structure-of-arrays index array)
/// is computed once up front by [`Plan::candidates`].
pub struct QueryIter<'w, D: QueryData> {
    pub(super) storage: &'w Storage,
    pub(super) slots: Vec<usize>,
    pub(super) candidates: std::vec::IntoIter<Entity>,
    pub(super) _marker: PhantomData<D>,
}

impl<'w, D: QueryData> Iterator for QueryIter<'w, D> {
    type Item = D::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let entity = self.candidates.next()?;
        // SAFETY: `entity` came from `Plan::candidates`, which only yields
        // entities that are live and satisfy every slot this query touches.
        Some(unsafe { D::fetch(self.storage, entity, &self.slots) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.candidates.size_hint()
    }
}

/// Same as [`QueryIter`] but also yields the owning [`Entity`].
pub struct QueryIterWithEntity<'w, D: QueryData> {
    pub(super) inner: QueryIter<'w, D>,
}

impl<'w, D: QueryData> Iterator for QueryIterWithEntity<'w, D> {
    type Item = (Entity, D::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let entity = self.inner.candidates.next()?;
        let item = unsafe { D::fetch(self.inner.storage, entity, &self.inner.slots) };
        Some((entity, item))
    }
}
