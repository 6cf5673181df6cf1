//! [`WorldBuilder`]: the sole configuration surface for a [`super::World`].

use crate::ecs::entity::OverflowPolicy;
use crate::error::CrashReason;

use super::World;

/// Builds a [`World`] with a fixed entity capacity and overflow behavior.
///
/// There is no way to change `max_entities` or the overflow policy after
/// `build()`; both are load-bearing for every sparse-set size computation
/// the world does afterward.
pub struct WorldBuilder {
    max_entities: u32,
    overflow_policy: OverflowPolicy,
    on_crash: Option<Box<dyn FnMut(CrashReason)>>,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self {
            max_entities: 1024,
            overflow_policy: OverflowPolicy::Crash,
            on_crash: None,
        }
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// `build()` panics if this is never set above zero.
    pub fn max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = max_entities;
        self
    }

    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Called just before the process aborts under `OverflowPolicy::Crash`.
    /// Defaults to logging via `log::error!` and panicking.
    pub fn on_crash(mut self, on_crash: impl FnMut(CrashReason) + 'static) -> Self {
        self.on_crash = Some(Box::new(on_crash));
        self
    }

    pub fn build(self) -> World {
        assert!(
            self.max_entities > 0,
            "WorldBuilder::max_entities must be greater than 0"
        );
        let on_crash = self.on_crash.unwrap_or_else(|| {
            Box::new(|reason: CrashReason| {
                log::error!("world crashed: {reason}");
            })
        });
        World::new(self.max_entities, self.overflow_policy, on_crash)
    }
}
