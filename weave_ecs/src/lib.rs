//! Sparse-set entity-component-system runtime with staged scheduling.
//!
//! A [`ecs::World`] owns entities, their components, resources, and events.
//! Systems are ordinary functions taking [`ecs::query::Query`],
//! [`ecs::commands::Commands`], [`ecs::system::Res`], [`ecs::system::ResMut`],
//! [`ecs::system::EventWriter`], or [`ecs::system::EventReceiver`] arguments,
//! registered onto a [`ecs::schedule::Schedule`] and run a stage at a time.
//!
//! `extern crate self as weave_ecs` lets `weave_macros`' derive output
//! (`#[derive(Component)]` and friends) refer to `::weave_ecs::ecs::...`
//! paths that resolve the same way from inside this crate's own tests as
//! from a downstream crate.
extern crate self as weave_ecs;

pub mod ecs;
pub mod error;
pub mod util;

pub use ecs::{
    Commands, Component, Entity, Event, EventReader, EventReceiver, EventWriter, IntoSystem,
    Label, OverflowPolicy, Query, QueryData, QueryFilter, Read, Res, ResMut, Resource, Section,
    With, Without, World, WorldBuilder, Write,
};
pub use error::Error;
pub use weave_macros::{Component as DeriveComponent, Event as DeriveEvent, Resource as DeriveResource};
