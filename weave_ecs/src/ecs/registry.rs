//! Unified type registry for components, resources, and events.
//!
//! Every type `weave_ecs` needs a stable identity for — components, resources,
//! and event payloads — is registered here exactly once and handed a dense
//! [`TypeId`]. Mutual exclusion between the three kinds keeps the access model
//! simple: a type can be a component, a resource, or an event payload, never
//! more than one, so a single `TypeId` namespace and a single bitset pair
//! (see [`crate::ecs::entity::table::EntityTable`]) cover component membership
//! without a separate id space per kind.
//!
//! Components additionally get a dense `component_slot`, a sub-numbering of
//! `TypeId` restricted to component-kind types starting at 0. `ComponentColumn`
//! storage and entity masks are indexed by `component_slot`, not `TypeId`,
//! so registering resources or events never wastes mask bits.
//!
//! # Thread Safety
//!
//! Reads are lock-free via `DashMap`; writes (first registration of a type)
//! take a brief lock. `World` itself is `!Send` (see
//! [`crate::ecs::world::World`]), but the registry is kept independently
//! shareable so multiple worlds — or tests running concurrently — can resolve
//! the same Rust type to the same id.

use std::{
    any::TypeId as StdTypeId,
    fmt,
    sync::{
        RwLock,
        atomic::{AtomicU32, Ordering},
    },
};

use dashmap::DashMap;

use crate::error::Error;

/// What a registered type is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A component type, attached to entities via [`crate::ecs::storage::column::ComponentColumn`].
    Component,
    /// A singleton resource (spec.md calls these "resources"; world-lifetime, one value per type).
    Resource,
    /// An event payload type, buffered in an [`crate::ecs::event::pool::EventPool`].
    Event,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Component => write!(f, "component"),
            TypeKind::Resource => write!(f, "resource"),
            TypeKind::Event => write!(f, "event"),
        }
    }
}

/// A dense identifier for a registered type, unique within one [`TypeRegistry`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TypeId {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Metadata recorded about a registered type.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    kind: TypeKind,
    type_id: StdTypeId,
    type_name: &'static str,
    /// Only meaningful for `TypeKind::Component`: the dense, component-only
    /// numbering used to index `ComponentColumn` storage and entity masks.
    component_slot: Option<u32>,
}

impl TypeInfo {
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The dense component-only slot, or `None` if this type is not a component.
    #[inline]
    pub fn component_slot(&self) -> Option<usize> {
        self.component_slot.map(|s| s as usize)
    }
}

/// A registry mapping Rust types to dense, stable [`TypeId`]s.
pub struct TypeRegistry {
    type_map: DashMap<StdTypeId, TypeId>,
    types: RwLock<Vec<TypeInfo>>,
    next_id: AtomicU32,
    next_component_slot: AtomicU32,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            types: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
            next_component_slot: AtomicU32::new(0),
        }
    }

    /// Register `T` as a component, returning its `TypeId`.
    ///
    /// Idempotent: registering the same type twice returns the same id.
    ///
    /// # Panics
    /// Panics if `T` is already registered as a different kind.
    pub fn register_component<T: 'static>(&self) -> TypeId {
        self.register::<T>(TypeKind::Component)
    }

    /// Register `T` as a resource, returning its `TypeId`.
    ///
    /// # Panics
    /// Panics if `T` is already registered as a different kind.
    pub fn register_resource<T: 'static>(&self) -> TypeId {
        self.register::<T>(TypeKind::Resource)
    }

    /// Register `T` as an event payload, returning its `TypeId`.
    ///
    /// # Panics
    /// Panics if `T` is already registered as a different kind.
    pub fn register_event<T: 'static>(&self) -> TypeId {
        self.register::<T>(TypeKind::Event)
    }

    fn register<T: 'static>(&self, kind: TypeKind) -> TypeId {
        let std_type_id = StdTypeId::of::<T>();

        if let Some(existing) = self.type_map.get(&std_type_id) {
            let id = *existing;
            self.assert_kind::<T>(id, kind);
            return id;
        }

        match self.type_map.entry(std_type_id) {
            dashmap::Entry::Occupied(occupied) => {
                let id = *occupied.get();
                self.assert_kind::<T>(id, kind);
                id
            }
            dashmap::Entry::Vacant(vacant) => {
                let id_value = self.next_id.fetch_add(1, Ordering::Relaxed);
                let id = TypeId(id_value);

                let component_slot = if kind == TypeKind::Component {
                    Some(self.next_component_slot.fetch_add(1, Ordering::Relaxed))
                } else {
                    None
                };

                let mut types = self.types.write().unwrap();
                let index = id_value as usize;
                if index >= types.len() {
                    types.resize(
                        index + 1,
                        TypeInfo {
                            id,
                            kind,
                            type_id: std_type_id,
                            type_name: "",
                            component_slot: None,
                        },
                    );
                }
                types[index] = TypeInfo {
                    id,
                    kind,
                    type_id: std_type_id,
                    type_name: std::any::type_name::<T>(),
                    component_slot,
                };

                vacant.insert(id);
                id
            }
        }
    }

    fn assert_kind<T: 'static>(&self, id: TypeId, expected: TypeKind) {
        let types = self.types.read().unwrap();
        if let Some(info) = types.get(id.index())
            && info.kind() != expected
        {
            panic!(
                "type '{}' is already registered as a {}, cannot register as {}",
                std::any::type_name::<T>(),
                info.kind(),
                expected
            );
        }
    }

    /// Get the id for `T` if it has been registered at all.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<TypeId> {
        self.type_map
            .get(&StdTypeId::of::<T>())
            .map(|entry| *entry.value())
    }

    /// Get the id for `T` only if it was registered as a component.
    pub fn get_component<T: 'static>(&self) -> Option<TypeId> {
        self.get_if_kind::<T>(TypeKind::Component)
    }

    /// Resolve `T`'s component slot, or fail per spec.md §7's
    /// `UnregisteredComponent`: debug builds panic immediately (a missing
    /// registration is a bug to catch in development), release builds
    /// return `Err` so a host application can decide how to fail.
    pub fn require_component_slot<T: 'static>(&self) -> Result<usize, Error> {
        if let Some(id) = self.get_component::<T>() {
            return Ok(id.index());
        }
        let name = std::any::type_name::<T>();
        if cfg!(debug_assertions) {
            panic!("component '{name}' is not registered");
        }
        Err(Error::UnregisteredComponent(name))
    }

    /// Get the id for `T` only if it was registered as a resource.
    pub fn get_resource<T: 'static>(&self) -> Option<TypeId> {
        self.get_if_kind::<T>(TypeKind::Resource)
    }

    /// Get the id for `T` only if it was registered as an event payload.
    pub fn get_event<T: 'static>(&self) -> Option<TypeId> {
        self.get_if_kind::<T>(TypeKind::Event)
    }

    fn get_if_kind<T: 'static>(&self, expected: TypeKind) -> Option<TypeId> {
        let id = self.get::<T>()?;
        let types = self.types.read().unwrap();
        types
            .get(id.index())
            .filter(|info| info.kind() == expected)
            .map(|info| info.id())
    }

    #[inline]
    pub fn info(&self, id: TypeId) -> Option<TypeInfo> {
        let types = self.types.read().unwrap();
        types.get(id.index()).copied()
    }

    /// The number of component-kind types registered so far; the upper bound
    /// `N` for mask bitsets and component-slot-indexed storage.
    pub fn component_count(&self) -> usize {
        self.next_component_slot.load(Ordering::Relaxed) as usize
    }

    /// The total number of registered types across all kinds.
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
