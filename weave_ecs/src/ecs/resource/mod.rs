//! The [`Resource`] marker trait.
//!
//! A resource is a world-lifetime singleton value accessed by type rather
//! than by entity, e.g. a game clock or an asset cache. Spec.md calls these
//! "resources"; `weave_ecs` keeps them in a dedicated [`crate::ecs::storage::resources::ResourceStorage`]
//! rather than mixing them into component columns.

/// Marker trait for types storable as a world singleton.
pub trait Resource: 'static {}
