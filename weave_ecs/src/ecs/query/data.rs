//! Query filters: `With<T>` and `Without<T>`, composed into tuples.
//!
//! Filters never fetch data, only narrow the candidate entity set — they
//! contribute positive (`With`) or negative (`Without`) slots to the query's
//! bitmask test, same as the required half of the data tuple but without an
//! `Item` to produce.

use std::marker::PhantomData;

use crate::ecs::component::Component;
use crate::ecs::registry::TypeRegistry;
use crate::error::Error;

/// One filter term: a component slot plus whether its presence (`true`) or
/// absence (`false`) is required.
pub struct FilterShape {
    pub slots: Vec<(usize, bool)>,
}

pub trait QueryFilter {
    /// Debug builds panic if a referenced type was never registered; release
    /// builds return [`Error::UnregisteredComponent`] (spec.md §7).
    fn shape(registry: &TypeRegistry) -> Result<FilterShape, Error>;
}

/// Restrict a query to entities that have component `T`, without fetching it.
pub struct With<T>(PhantomData<fn() -> T>);

impl<T: Component> QueryFilter for With<T> {
    fn shape(registry: &TypeRegistry) -> Result<FilterShape, Error> {
        let slot = registry.require_component_slot::<T>()?;
        Ok(FilterShape {
            slots: vec![(slot, true)],
        })
    }
}

/// Restrict a query to entities that do not have component `T`.
pub struct Without<T>(PhantomData<fn() -> T>);

impl<T: Component> QueryFilter for Without<T> {
    fn shape(registry: &TypeRegistry) -> Result<FilterShape, Error> {
        let slot = registry.require_component_slot::<T>()?;
        Ok(FilterShape {
            slots: vec![(slot, false)],
        })
    }
}

impl QueryFilter for () {
    fn shape(_registry: &TypeRegistry) -> Result<FilterShape, Error> {
        Ok(FilterShape { slots: Vec::new() })
    }
}

macro_rules! impl_query_filter {
    ($($name:ident),*) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($name: QueryFilter),*> QueryFilter for ($($name,)*) {
            fn shape(registry: &TypeRegistry) -> Result<FilterShape, Error> {
                let mut slots = Vec::new();
                $(slots.extend($name::shape(registry)?.slots);)*
                Ok(FilterShape { slots })
            }
        }
    };
}

crate::all_tuples!(impl_query_filter);
