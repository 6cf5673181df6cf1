//! The error taxonomy for `weave_ecs`.
//!
//! Recoverable conditions (allocation failure, missing entities, entity
//! population overflow) are ordinary [`Error`] values propagated with `?`.
//! Programmer errors (querying an unregistered type, a malformed query
//! specification) panic instead: they indicate a bug in the calling code, not
//! a runtime condition a caller could sensibly handle.

use std::fmt;

use crate::ecs::entity::Entity;

/// Errors produced by fallible `weave_ecs` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A heap allocation required to grow a component column or event pool failed.
    #[error("allocation failure while growing storage")]
    OutOfMemory,

    /// An operation targeted an entity that is not currently live.
    #[error("entity {0:?} is not spawned")]
    EntityMissing(Entity),

    /// A component type was used before `World::register_component` ran.
    ///
    /// Debug builds panic immediately instead of returning this (a missing
    /// registration is a bug to catch in development); release builds
    /// return it so a host application can decide how to fail.
    #[error("component '{0}' is not registered")]
    UnregisteredComponent(&'static str),

    /// `set_parent` referenced a parent entity that is not currently live.
    #[error("parent entity {0:?} is not spawned")]
    ParentMissing(Entity),

    /// The live population reached `max_entities` and the overflow policy
    /// could not (or was configured not to) reclaim a slot.
    #[error("entity population exceeded max_entities ({0})")]
    EntityOverflow(u32),
}

/// The reason passed to a world's `on_crash` callback.
///
/// Distinct from [`Error`]: a crash reason describes a fatal condition the
/// host is being notified of before the process aborts, not a value handed
/// back through a `Result`.
#[derive(Debug, Clone)]
pub enum CrashReason {
    /// `max_entities` was reached under the `Crash` overflow policy.
    EntityOverflow { max_entities: u32 },
}

impl fmt::Display for CrashReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashReason::EntityOverflow { max_entities } => {
                write!(
                    f,
                    "entity population exceeded max_entities ({max_entities}) under the Crash overflow policy"
                )
            }
        }
    }
}
