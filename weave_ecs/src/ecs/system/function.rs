//! Turning a plain Rust function into a [`super::System`].
//!
//! `fn foo(query: Query<...>, commands: Commands)` becomes a system via
//! [`IntoSystem::into_system`] without the caller writing any boilerplate,
//! the same variadic-arity trick used throughout `weave_ecs` for tuples
//! (see [`crate::all_tuples`]). A system function may return `()` or
//! `Result<(), Error>`; both are normalized to the latter by [`IntoSystemResult`]
//! so the scheduler has one propagation path to reason about (spec.md §6).

use std::marker::PhantomData;

use crate::ecs::world::World;
use crate::error::Error;

use super::param::SystemParam;
use super::System;

/// Normalizes a system function's return type to `Result<(), Error>`.
pub trait IntoSystemResult {
    fn into_system_result(self) -> Result<(), Error>;
}

impl IntoSystemResult for () {
    fn into_system_result(self) -> Result<(), Error> {
        Ok(())
    }
}

impl IntoSystemResult for Result<(), Error> {
    fn into_system_result(self) -> Result<(), Error> {
        self
    }
}

/// Implemented for functions/closures whose arguments are all [`SystemParam`]s.
pub trait SystemParamFunction<Params>: 'static {
    fn run(&mut self, world: &World) -> Result<(), Error>;
}

macro_rules! impl_system_param_function {
    ($($param:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<Func, Out, $($param: SystemParam),*> SystemParamFunction<($($param,)*)> for Func
        where
            Func: for<'w> FnMut($($param::Item<'w>),*) -> Out + 'static,
            Out: IntoSystemResult,
        {
            fn run(&mut self, world: &World) -> Result<(), Error> {
                // SAFETY: the scheduler fetches every param for this one
                // call and drops them all before the next system runs; see
                // `SystemParam::fetch`'s contract.
                $(let $param = unsafe { $param::fetch(world) }?;)*
                self($($param),*).into_system_result()
            }
        }
    };
}

crate::all_tuples!(impl_system_param_function);

// `all_tuples!` only covers arities 1..=16 (see `crate::for_every_tuple`); a
// parameterless system needs its own impl.
impl<Func, Out> SystemParamFunction<()> for Func
where
    Func: FnMut() -> Out + 'static,
    Out: IntoSystemResult,
{
    fn run(&mut self, _world: &World) -> Result<(), Error> {
        self().into_system_result()
    }
}

/// Wraps a function/closure plus its resolved parameter types so it can be
/// stored as a `Box<dyn System>` in a [`crate::ecs::schedule::Schedule`].
pub struct FunctionSystem<Func, Params> {
    func: Func,
    name: &'static str,
    _marker: PhantomData<fn() -> Params>,
}

impl<Func, Params> System for FunctionSystem<Func, Params>
where
    Func: SystemParamFunction<Params>,
    Params: 'static,
{
    fn run(&mut self, world: &World) -> Result<(), Error> {
        self.func.run(world)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Implemented for any function/closure whose parameters are all
/// [`SystemParam`]s, converting it into a boxable [`super::System`].
pub trait IntoSystem<Params> {
    type System: System;

    fn into_system(self) -> Self::System;
}

impl<Func, Params> IntoSystem<Params> for Func
where
    Func: SystemParamFunction<Params>,
    Params: 'static,
{
    type System = FunctionSystem<Func, Params>;

    fn into_system(self) -> Self::System {
        FunctionSystem {
            name: std::any::type_name::<Func>(),
            func: self,
            _marker: PhantomData,
        }
    }
}
