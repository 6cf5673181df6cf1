//! Systems: ordinary Rust functions run against a [`crate::ecs::world::World`].

pub mod function;
pub mod param;

pub use function::{FunctionSystem, IntoSystem, SystemParamFunction};
pub use param::{EventReceiver, EventWriter, Res, ResMut, SystemParam};

use crate::ecs::world::World;
use crate::error::Error;

/// A runnable unit of per-frame logic, registered into a [`crate::ecs::schedule::Schedule`].
pub trait System: 'static {
    fn run(&mut self, world: &World) -> Result<(), Error>;

    /// A human-readable name for logging (`std::any::type_name` of the
    /// original function by default).
    fn name(&self) -> &'static str;
}

/// Type-erased storage for a registered system.
pub struct BoxedSystem {
    inner: Box<dyn System>,
}

impl BoxedSystem {
    pub fn new<S: System>(system: S) -> Self {
        Self {
            inner: Box::new(system),
        }
    }

    pub fn run(&mut self, world: &World) -> Result<(), Error> {
        log::trace!("running system {}", self.inner.name());
        self.inner.run(world)
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }
}
