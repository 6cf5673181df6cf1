//! The [`SystemParam`] trait: how a system function's arguments are pulled
//! out of a running [`crate::ecs::world::World`].
//!
//! Every param type here is fetched from a shared `&World`, even the ones
//! that mutate (`Commands::spawn`, `ResMut`). That is sound only because the
//! scheduler (spec.md §6) runs systems strictly one at a time and never
//! reenters a system while its params are still live — see each impl's
//! safety comment for the specific aliasing argument.

use std::any::type_name;
use std::ops::{Deref, DerefMut};

use crate::ecs::changes::ChangesList;
use crate::ecs::commands::Commands;
use crate::ecs::entity::EntityTable;
use crate::ecs::event::{Event, EventReader, EventStorage};
use crate::ecs::query::{QueryData, QueryFilter};
use crate::ecs::resource::Resource;
use crate::ecs::storage::Storage;
use crate::ecs::world::World;
use crate::ecs::Query;
use crate::error::Error;

/// Implemented by every type a system function can take by value as an argument.
pub trait SystemParam {
    type Item<'w>;

    /// # Safety
    /// The caller must guarantee no other live `SystemParam` derived from
    /// the same `world` aliases the memory this fetch touches mutably.
    /// The scheduler upholds this by constructing a system's params in one
    /// pass, immediately before calling it, and dropping them before the
    /// next system's params are fetched.
    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error>;
}

impl<D: QueryData + 'static, F: QueryFilter + 'static> SystemParam for Query<'_, D, F> {
    type Item<'w> = Query<'w, D, F>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        Query::new(world.storage(), world.registry())
    }
}

impl SystemParam for Commands<'_> {
    type Item<'w> = Commands<'w>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        // SAFETY: only the entity table's allocation bookkeeping is mutated
        // through this pointer (see `Commands::spawn`), never a component
        // column, so it cannot alias a `Query`'s column pointers fetched in
        // the same pass.
        let storage_ptr = world.storage() as *const Storage as *mut Storage;
        let entities_ptr: *mut EntityTable = unsafe { (*storage_ptr).entities_mut() };
        let changes_ptr = world.changes() as *const ChangesList as *mut ChangesList;
        Ok(unsafe {
            Commands::new(
                world.storage(),
                entities_ptr,
                world.registry(),
                world.change_queue(),
                changes_ptr,
            )
        })
    }
}

/// Shared, read-only access to resource `R`.
pub struct Res<'w, R: Resource> {
    value: &'w R,
}

impl<R: Resource> Deref for Res<'_, R> {
    type Target = R;
    fn deref(&self) -> &R {
        self.value
    }
}

impl<R: Resource> SystemParam for Res<'_, R> {
    type Item<'w> = Res<'w, R>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        let value = world
            .storage()
            .resources()
            .get::<R>()
            .unwrap_or_else(|| panic!("resource '{}' is not registered", type_name::<R>()));
        Ok(Res { value })
    }
}

/// Exclusive, mutable access to resource `R`.
pub struct ResMut<'w, R: Resource> {
    value: &'w mut R,
}

impl<R: Resource> Deref for ResMut<'_, R> {
    type Target = R;
    fn deref(&self) -> &R {
        self.value
    }
}

impl<R: Resource> DerefMut for ResMut<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.value
    }
}

impl<R: Resource> SystemParam for ResMut<'_, R> {
    type Item<'w> = ResMut<'w, R>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        // SAFETY: the scheduler never fetches two params that both resolve
        // to the same resource type for one system call; a system asking
        // for `ResMut<R>` twice is a programmer error the borrow it takes
        // below will itself catch via aliased-mutable-reference UB only if
        // misused across systems, which the scheduler's one-at-a-time
        // dispatch rules out.
        let storage_ptr = world.storage() as *const Storage as *mut Storage;
        let value = unsafe { (*storage_ptr).resources_mut() }
            .get_mut::<R>()
            .unwrap_or_else(|| panic!("resource '{}' is not registered", type_name::<R>()));
        Ok(ResMut { value })
    }
}

/// Send-only handle to event type `E`'s pool.
pub struct EventWriter<'w, E: Event> {
    events: *mut EventStorage,
    _marker: std::marker::PhantomData<&'w fn(E)>,
}

impl<E: Event> EventWriter<'_, E> {
    pub fn send(&mut self, event: E) {
        // SAFETY: see `SystemParam::fetch`'s contract; no other live param
        // fetched in this pass holds a reference into this world's events.
        unsafe { (*self.events).publish(event) };
    }
}

impl<E: Event> SystemParam for EventWriter<'_, E> {
    type Item<'w> = EventWriter<'w, E>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        let events_ptr = world.events() as *const EventStorage as *mut EventStorage;
        Ok(EventWriter {
            events: events_ptr,
            _marker: std::marker::PhantomData,
        })
    }
}

/// Read-only handle to event type `E`'s pool, advancing its own cursor.
///
/// The cursor is a [`EventReader<E>`] resource the world must already hold —
/// insert one with `World::insert_resource(EventReader::<E>::new())` before
/// a system asks for `EventReceiver<E>`. Two systems each holding their own
/// `EventReader<E>` resource (registered under distinct wrapper types, since
/// resources are keyed one-per-type) see every event independently.
pub struct EventReceiver<'w, E: Event> {
    events: *mut EventStorage,
    reader: *mut EventReader<E>,
    _marker: std::marker::PhantomData<&'w ()>,
}

impl<E: Event> EventReceiver<'_, E> {
    pub fn read(&mut self) -> &[E] {
        // SAFETY: see `SystemParam::fetch`'s contract. The reader pointer
        // comes from the same resource slot `ResMut<EventReader<E>>` would
        // borrow, and the scheduler never fetches both for one system call.
        unsafe { (*self.events).read(&mut *self.reader) }
    }
}

impl<E: Event> SystemParam for EventReceiver<'_, E> {
    type Item<'w> = EventReceiver<'w, E>;

    unsafe fn fetch<'w>(world: &'w World) -> Result<Self::Item<'w>, Error> {
        let events_ptr = world.events() as *const EventStorage as *mut EventStorage;
        let storage_ptr = world.storage() as *const Storage as *mut Storage;
        let reader_ptr: *mut EventReader<E> = unsafe { (*storage_ptr).resources_mut() }
            .get_mut::<EventReader<E>>()
            .unwrap_or_else(|| {
                panic!(
                    "no EventReader<{0}> resource registered; call \
                     World::insert_resource(EventReader::<{0}>::new()) before a system reads it",
                    type_name::<E>()
                )
            });
        Ok(EventReceiver {
            events: events_ptr,
            reader: reader_ptr,
            _marker: std::marker::PhantomData,
        })
    }
}
