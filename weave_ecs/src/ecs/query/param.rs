//! Per-field query fetchers: `Read<T>`, `Write<T>`, and `Option<F>` for
//! optional access, composed into tuples via [`crate::all_tuples`].

use std::marker::PhantomData;

use crate::ecs::component::Component;
use crate::ecs::entity::Entity;
use crate::ecs::registry::TypeRegistry;
use crate::ecs::storage::Storage;
use crate::error::Error;

/// One field of a query's required-or-optional component set.
///
/// `fetch` is unsafe: callers must guarantee `entity` is live and that no
/// structural mutation has touched `storage` since the slot was resolved,
/// which is exactly what the deferred change queue guarantees for the
/// duration of a system's body.
pub trait Fetch {
    type Item<'a>;

    /// This field's component slot.
    ///
    /// Debug builds panic if `T` was never registered; release builds
    /// return [`Error::UnregisteredComponent`] (spec.md §7).
    fn component_slot(registry: &TypeRegistry) -> Result<usize, Error>;

    /// Whether a missing value is tolerated (`Option<_>`) or excludes the
    /// entity from the result set entirely.
    fn optional() -> bool;

    /// # Safety
    /// `entity` must be live and `slot` must be the slot returned by
    /// [`Fetch::component_slot`] for this type.
    unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slot: usize) -> Self::Item<'a>;
}

/// Shared, read-only access to a component.
pub struct Read<T>(PhantomData<fn() -> T>);

impl<T: Component> Fetch for Read<T> {
    type Item<'a> = &'a T;

    fn component_slot(registry: &TypeRegistry) -> Result<usize, Error> {
        registry.require_component_slot::<T>()
    }

    fn optional() -> bool {
        false
    }

    unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slot: usize) -> &'a T {
        storage
            .column::<T>(slot)
            .and_then(|c| c.get(entity))
            .expect("fetch called for entity missing this component")
    }
}

/// Exclusive, mutable access to a component.
pub struct Write<T>(PhantomData<fn() -> T>);

impl<T: Component> Fetch for Write<T> {
    type Item<'a> = &'a mut T;

    fn component_slot(registry: &TypeRegistry) -> Result<usize, Error> {
        Read::<T>::component_slot(registry)
    }

    fn optional() -> bool {
        false
    }

    unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slot: usize) -> &'a mut T {
        let ptr = storage
            .column::<T>(slot)
            .and_then(|c| c.get_ptr(entity))
            .expect("fetch called for entity missing this component");
        // SAFETY: the caller's contract (see `Fetch::fetch`) guarantees no
        // structural mutation has occurred since `slot` was resolved, and
        // the query engine never hands out two live references to the same
        // slot (see query::mod's duplicate-role check), so this is the only
        // live borrow of `*ptr`.
        unsafe { &mut *ptr }
    }
}

impl<F: Fetch> Fetch for Option<F> {
    type Item<'a> = Option<F::Item<'a>>;

    fn component_slot(registry: &TypeRegistry) -> Result<usize, Error> {
        F::component_slot(registry)
    }

    fn optional() -> bool {
        true
    }

    unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slot: usize) -> Self::Item<'a> {
        if storage.has_component(entity, slot) {
            Some(unsafe { F::fetch(storage, entity, slot) })
        } else {
            None
        }
    }
}

/// The resolved shape of a [`super::Query`]'s data tuple: one slot per
/// field, paired with whether that field tolerates absence.
pub struct QueryShape {
    pub slots: Vec<(usize, bool)>,
}

/// Implemented for tuples of [`Fetch`] types via [`crate::all_tuples`].
pub trait QueryData {
    type Item<'a>;

    fn shape(registry: &TypeRegistry) -> Result<QueryShape, Error>;

    /// # Safety
    /// `entity` must be live and `slots` must be exactly the slots returned
    /// by [`QueryData::shape`], in the same order.
    unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slots: &[usize]) -> Self::Item<'a>;
}

macro_rules! impl_query_data {
    ($($name:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<$($name: Fetch),*> QueryData for ($($name,)*) {
            type Item<'a> = ($($name::Item<'a>,)*);

            fn shape(registry: &TypeRegistry) -> Result<QueryShape, Error> {
                Ok(QueryShape {
                    slots: vec![$(($name::component_slot(registry)?, $name::optional())),*],
                })
            }

            unsafe fn fetch<'a>(storage: &'a Storage, entity: Entity, slots: &[usize]) -> Self::Item<'a> {
                let mut idx = 0;
                $(
                    let slot = slots[idx];
                    idx += 1;
                    let $name = unsafe { $name::fetch(storage, entity, slot) };
                )*
                ($($name,)*)
            }
        }
    };
}

crate::all_tuples!(impl_query_data);
