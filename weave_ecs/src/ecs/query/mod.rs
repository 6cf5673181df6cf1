//! The query engine: spec.md §5.
//!
//! A [`Query<D, F>`] reads `D` (a tuple of [`param::Read`]/[`param::Write`]/
//! `Option<_>` fields) from every live entity matching filter `F` (a tuple
//! of [`data::With`]/[`data::Without`]). Construction resolves slots once,
//! picks a driver column, and panics eagerly on a malformed query (same
//! slot required twice, or required and excluded at once) rather than
//! producing a silently wrong result set.

pub mod data;
pub mod param;
mod result;

pub use data::{QueryFilter, With, Without};
pub use param::{Fetch, QueryData, Read, Write};
pub use result::{QueryIter, QueryIterWithEntity};

use std::marker::PhantomData;

use crate::ecs::entity::Entity;
use crate::ecs::registry::TypeRegistry;
use crate::ecs::storage::Storage;
use crate::error::Error;

use result::Plan;

/// A read of the world shaped by `D`, narrowed by filter `F` (default: none).
pub struct Query<'w, D: QueryData, F: QueryFilter = ()> {
    storage: &'w Storage,
    plan: Plan,
    _data: PhantomData<D>,
    _filter: PhantomData<F>,
}

impl<'w, D: QueryData, F: QueryFilter> Query<'w, D, F> {
    /// Debug builds panic if a referenced type was never registered or a
    /// query is malformed (duplicate slot, conflicting `With`/`Without`);
    /// release builds return [`Error::UnregisteredComponent`] for the
    /// former, since that alone is recoverable rather than a fixed bug in
    /// the query's shape (spec.md §7).
    pub fn new(storage: &'w Storage, registry: &TypeRegistry) -> Result<Self, Error> {
        let plan = Plan::resolve::<D, F>(registry)?;
        Ok(Self {
            storage,
            plan,
            _data: PhantomData,
            _filter: PhantomData,
        })
    }

    fn slots(&self) -> Vec<usize> {
        self.plan.data_slots.iter().map(|&(slot, _)| slot).collect()
    }

    pub fn iter(&self) -> QueryIter<'w, D> {
        QueryIter {
            storage: self.storage,
            slots: self.slots(),
            candidates: self.plan.candidates(self.storage).into_iter(),
            _marker: PhantomData,
        }
    }

    pub fn iter_with_entity(&self) -> QueryIterWithEntity<'w, D> {
        QueryIterWithEntity { inner: self.iter() }
    }

    pub fn get(&self, entity: Entity) -> Option<D::Item<'w>> {
        if !self.storage.entities().is_live(entity) {
            return None;
        }
        let slots = self.slots();
        let passes = self
            .plan
            .positive
            .iter()
            .all(|&s| self.storage.has_component(entity, s))
            && self
                .plan
                .negative
                .iter()
                .all(|&s| !self.storage.has_component(entity, s));
        if !passes {
            return None;
        }
        // SAFETY: `entity` is live and satisfies every slot this query touches.
        Some(unsafe { D::fetch(self.storage, entity, &slots) })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
