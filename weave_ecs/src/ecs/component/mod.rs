//! The [`Component`] marker trait.
//!
//! A component is any `'static` value that can be attached to an entity
//! through a [`crate::ecs::storage::column::ComponentColumn`]. Implement it
//! by hand or derive it with `#[derive(weave_macros::Component)]`.

/// Marker trait for types storable in a [`crate::ecs::storage::column::ComponentColumn`].
///
/// No required methods: the trait exists purely to say "this type has
/// opted in to component storage," mirroring how `weave_ecs` keeps
/// components, resources, and events as three distinct, non-overlapping
/// kinds in the [`crate::ecs::registry::TypeRegistry`].
pub trait Component: 'static {}
