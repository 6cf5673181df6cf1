//! Type-erased storage for world resources.
//!
//! A resource is a world-lifetime singleton, one value per type, looked up
//! by `TypeId` rather than by entity — the same type-erasure technique as
//! [`crate::ecs::event::EventStorage`], adapted from the teacher's "Unique"
//! storage.

use std::{any::Any, any::TypeId as StdTypeId, collections::HashMap};

use crate::ecs::resource::Resource;

#[derive(Default)]
pub struct ResourceStorage {
    values: HashMap<StdTypeId, Box<dyn Any>>,
}

impl ResourceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, replacing any existing resource of this type. Returns
    /// the previous value, if any.
    pub fn insert<R: Resource>(&mut self, value: R) -> Option<R> {
        self.values
            .insert(StdTypeId::of::<R>(), Box::new(value))
            .map(|prev| *prev.downcast::<R>().expect("resource type mismatch"))
    }

    pub fn remove<R: Resource>(&mut self) -> Option<R> {
        self.values
            .remove(&StdTypeId::of::<R>())
            .map(|prev| *prev.downcast::<R>().expect("resource type mismatch"))
    }

    pub fn get<R: Resource>(&self) -> Option<&R> {
        self.values
            .get(&StdTypeId::of::<R>())
            .map(|v| v.downcast_ref::<R>().expect("resource type mismatch"))
    }

    pub fn get_mut<R: Resource>(&mut self) -> Option<&mut R> {
        self.values
            .get_mut(&StdTypeId::of::<R>())
            .map(|v| v.downcast_mut::<R>().expect("resource type mismatch"))
    }

    pub fn contains<R: Resource>(&self) -> bool {
        self.values.contains_key(&StdTypeId::of::<R>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GameTime(f32);
    impl Resource for GameTime {}

    #[test]
    fn insert_then_get_round_trips() {
        let mut res = ResourceStorage::new();
        res.insert(GameTime(1.5));
        assert_eq!(res.get::<GameTime>().unwrap().0, 1.5);
    }

    #[test]
    fn insert_twice_replaces_and_returns_previous() {
        let mut res = ResourceStorage::new();
        res.insert(GameTime(1.0));
        let prev = res.insert(GameTime(2.0));
        assert_eq!(prev.unwrap().0, 1.0);
        assert_eq!(res.get::<GameTime>().unwrap().0, 2.0);
    }

    #[test]
    fn get_mut_allows_in_place_update() {
        let mut res = ResourceStorage::new();
        res.insert(GameTime(1.0));
        res.get_mut::<GameTime>().unwrap().0 += 1.0;
        assert_eq!(res.get::<GameTime>().unwrap().0, 2.0);
    }

    #[test]
    fn remove_clears_the_slot() {
        let mut res = ResourceStorage::new();
        res.insert(GameTime(1.0));
        assert!(res.remove::<GameTime>().is_some());
        assert!(res.get::<GameTime>().is_none());
    }
}
