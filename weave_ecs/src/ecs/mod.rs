//! The ECS runtime: entities, components, resources, events, storage, the
//! query engine, deferred commands, systems, the staged scheduler, and the
//! [`World`](world::World) that ties them all together.

pub mod changes;
pub mod commands;
pub mod component;
pub mod entity;
pub mod event;
pub mod query;
pub mod registry;
pub mod resource;
pub mod schedule;
pub mod storage;
pub mod system;
pub mod world;

pub use changes::ChangesList;
pub use commands::Commands;
pub use component::Component;
pub use entity::{Entity, OverflowPolicy};
pub use event::{Event, EventReader};
pub use query::{Query, QueryData, QueryFilter, Read, With, Without, Write};
pub use resource::Resource;
pub use schedule::{Label, Section};
pub use system::{EventReceiver, EventWriter, IntoSystem, Res, ResMut};
pub use world::{World, WorldBuilder};
