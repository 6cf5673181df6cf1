//! The staged scheduler: spec.md §6.
//!
//! A [`Schedule`] is an ordered list of [`Stage`]s; each stage is an ordered
//! list of labels (first-registered, first-run); each label has three
//! sections — `Before`, `During`, `After` — run in that fixed order; each
//! section holds systems in registration order. The world's change queue is
//! flushed after every single system, never batched across a label or
//! section, so a system never observes another system's queued mutation
//! except through the entity/component state that flush just committed.

pub mod label;

pub use label::{Label, Section, BODY};

use crate::ecs::system::{BoxedSystem, IntoSystem};
use crate::ecs::world::World;
use crate::error::Error;

#[derive(Default)]
struct LabelSlot {
    name: &'static str,
    before: Vec<BoxedSystem>,
    during: Vec<BoxedSystem>,
    after: Vec<BoxedSystem>,
}

impl LabelSlot {
    fn section_mut(&mut self, section: Section) -> &mut Vec<BoxedSystem> {
        match section {
            Section::Before => &mut self.before,
            Section::During => &mut self.during,
            Section::After => &mut self.after,
        }
    }

    fn systems_mut(&mut self) -> impl Iterator<Item = &mut BoxedSystem> {
        self.before
            .iter_mut()
            .chain(self.during.iter_mut())
            .chain(self.after.iter_mut())
    }
}

/// One phase of a frame (e.g. `"update"`, `"draw"`), holding its labels in
/// first-registered order.
#[derive(Default)]
pub struct Stage {
    name: &'static str,
    labels: Vec<LabelSlot>,
}

impl Stage {
    /// Every stage starts with the default `body` label already present
    /// (spec.md §4.5), so a system registered without ever calling
    /// `add_label_before`/`add_label_after` still lands somewhere.
    fn new(name: &'static str) -> Self {
        Self {
            name,
            labels: vec![LabelSlot {
                name: label::BODY,
                ..Default::default()
            }],
        }
    }

    fn label_mut(&mut self, label: &'static str) -> &mut LabelSlot {
        if let Some(pos) = self.labels.iter().position(|l| l.name == label) {
            &mut self.labels[pos]
        } else {
            self.labels.push(LabelSlot {
                name: label,
                ..Default::default()
            });
            self.labels.last_mut().unwrap()
        }
    }

    /// Insert `label` immediately before `anchor` in this stage's total
    /// order, or at the end if `anchor` isn't registered yet. A no-op if
    /// `label` already exists — labels keep a stable position once placed.
    fn insert_label_before(&mut self, label: &'static str, anchor: &'static str) {
        if self.labels.iter().any(|l| l.name == label) {
            return;
        }
        let pos = self
            .labels
            .iter()
            .position(|l| l.name == anchor)
            .unwrap_or(self.labels.len());
        self.labels.insert(
            pos,
            LabelSlot {
                name: label,
                ..Default::default()
            },
        );
    }

    /// Insert `label` immediately after `anchor`, or at the end if `anchor`
    /// isn't registered yet. A no-op if `label` already exists.
    fn insert_label_after(&mut self, label: &'static str, anchor: &'static str) {
        if self.labels.iter().any(|l| l.name == label) {
            return;
        }
        let pos = self
            .labels
            .iter()
            .position(|l| l.name == anchor)
            .map(|p| p + 1)
            .unwrap_or(self.labels.len());
        self.labels.insert(
            pos,
            LabelSlot {
                name: label,
                ..Default::default()
            },
        );
    }
}

/// An ordered collection of [`Stage`]s, each run independently via
/// [`Schedule::run_stage`] or [`Schedule::run_stage_catch`].
#[derive(Default)]
pub struct Schedule {
    stages: Vec<Stage>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage_mut(&mut self, stage: &'static str) -> &mut Stage {
        if let Some(pos) = self.stages.iter().position(|s| s.name == stage) {
            &mut self.stages[pos]
        } else {
            self.stages.push(Stage::new(stage));
            self.stages.last_mut().unwrap()
        }
    }

    pub fn has_stage(&self, stage: &'static str) -> bool {
        self.stages.iter().any(|s| s.name == stage)
    }

    /// Insert `label` immediately before `anchor` within `stage`'s total
    /// ordering (spec.md §4.5), creating the stage on first use. If `anchor`
    /// is not yet registered in this stage, `label` is appended at the end.
    pub fn add_label_before(&mut self, stage: &'static str, label: &'static str, anchor: &'static str) {
        self.stage_mut(stage).insert_label_before(label, anchor);
    }

    /// Insert `label` immediately after `anchor`; see [`Schedule::add_label_before`].
    pub fn add_label_after(&mut self, stage: &'static str, label: &'static str, anchor: &'static str) {
        self.stage_mut(stage).insert_label_after(label, anchor);
    }

    /// Register `system` under `stage`/`label`/`section`. Creates the stage
    /// and label on first use, in the order they are first mentioned.
    pub fn add_system<L, P>(
        &mut self,
        stage: &'static str,
        label: L,
        section: Section,
        system: impl IntoSystem<P>,
    ) where
        L: Label,
    {
        let label_name = label.name();
        self.stage_mut(stage)
            .label_mut(label_name)
            .section_mut(section)
            .push(BoxedSystem::new(system.into_system()));
    }

    /// Run every system in `stage`, in label/section/registration order,
    /// flushing the change queue after each one. Stops and returns the
    /// first error a system produces, leaving later systems in the stage
    /// unrun this frame.
    pub fn run_stage(&mut self, stage: &'static str, world: &mut World) -> Result<(), Error> {
        let Some(stage) = self.stages.iter_mut().find(|s| s.name == stage) else {
            log::debug!("run_stage: stage '{stage}' has no registered systems");
            return Ok(());
        };
        log::debug!("running stage '{}'", stage.name);
        for label in &mut stage.labels {
            log::trace!("running label '{}'", label.name);
            for system in label.systems_mut() {
                system.run(world)?;
                world.flush_changes();
            }
        }
        Ok(())
    }

    /// Like [`Schedule::run_stage`], but never stops early: a system that
    /// returns `Err` or panics is logged and skipped, and every remaining
    /// system in the stage still runs. Returns every logical error
    /// encountered, in the order their systems ran; panics are logged but
    /// not represented in the returned list, since [`Error`] only models
    /// spec.md's recoverable taxonomy, not arbitrary panic payloads.
    pub fn run_stage_catch(&mut self, stage: &'static str, world: &mut World) -> Vec<Error> {
        let Some(stage) = self.stages.iter_mut().find(|s| s.name == stage) else {
            log::debug!("run_stage_catch: stage '{stage}' has no registered systems");
            return Vec::new();
        };
        log::debug!("running stage '{}' (catch mode)", stage.name);
        let mut errors = Vec::new();
        for label in &mut stage.labels {
            for system in label.systems_mut() {
                let name = system.name();
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    system.run(world)
                }));
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        log::error!("system '{name}' returned an error: {err}");
                        errors.push(err);
                    }
                    Err(_) => {
                        log::error!("system '{name}' panicked; continuing with the next system");
                    }
                }
                world.flush_changes();
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::OverflowPolicy;
    use crate::ecs::world::WorldBuilder;

    fn world() -> World {
        WorldBuilder::new()
            .max_entities(8)
            .overflow_policy(OverflowPolicy::Crash)
            .build()
    }

    #[test]
    fn systems_run_in_before_during_after_order() {
        let mut schedule = Schedule::new();
        let mut world = world();
        world.storage_mut().resources_mut().insert(Log::default());
        world.register_resource::<Log>();

        schedule.add_system::<_, (ResMut<Log>,)>("update", "movement", Section::During, |mut log: ResMut<Log>| {
            log.0.push("during");
        });
        schedule.add_system::<_, (ResMut<Log>,)>("update", "movement", Section::Before, |mut log: ResMut<Log>| {
            log.0.push("before");
        });
        schedule.add_system::<_, (ResMut<Log>,)>("update", "movement", Section::After, |mut log: ResMut<Log>| {
            log.0.push("after");
        });

        schedule.run_stage("update", &mut world).unwrap();

        let log = world.storage().resources().get::<Log>().unwrap();
        assert_eq!(log.0, vec!["before", "during", "after"]);
    }

    #[test]
    fn systems_default_to_the_body_label() {
        let mut schedule = Schedule::new();
        let mut world = world();
        world.storage_mut().resources_mut().insert(Log::default());
        world.register_resource::<Log>();

        schedule.add_system::<_, (ResMut<Log>,)>(
            "update",
            label::BODY,
            Section::During,
            |mut log: ResMut<Log>| log.0.push("body"),
        );
        schedule.run_stage("update", &mut world).unwrap();

        let log = world.storage().resources().get::<Log>().unwrap();
        assert_eq!(log.0, vec!["body"]);
    }

    #[test]
    fn add_label_before_and_after_produce_a_total_ordering() {
        let mut schedule = Schedule::new();
        let mut world = world();
        world.storage_mut().resources_mut().insert(Log::default());
        world.register_resource::<Log>();

        schedule.add_label_before("update", "early", label::BODY);
        schedule.add_label_after("update", "late", label::BODY);

        schedule.add_system::<_, (ResMut<Log>,)>("update", label::BODY, Section::During, |mut log: ResMut<Log>| {
            log.0.push("body");
        });
        schedule.add_system::<_, (ResMut<Log>,)>("update", "late", Section::During, |mut log: ResMut<Log>| {
            log.0.push("late");
        });
        schedule.add_system::<_, (ResMut<Log>,)>("update", "early", Section::During, |mut log: ResMut<Log>| {
            log.0.push("early");
        });

        schedule.run_stage("update", &mut world).unwrap();

        let log = world.storage().resources().get::<Log>().unwrap();
        assert_eq!(log.0, vec!["early", "body", "late"]);
    }

    #[test]
    fn run_stage_propagates_the_first_error() {
        let mut schedule = Schedule::new();
        let mut world = world();

        schedule.add_system::<_, (crate::ecs::commands::Commands,)>("update", "a", Section::During, |_commands: crate::ecs::commands::Commands| {
            Err::<(), Error>(Error::OutOfMemory)
        });
        schedule.add_system::<_, ()>("update", "b", Section::During, || {});

        let result = schedule.run_stage("update", &mut world);
        assert!(result.is_err());
    }

    #[test]
    fn run_stage_catch_continues_past_a_panicking_system() {
        let mut schedule = Schedule::new();
        let mut world = world();
        world.storage_mut().resources_mut().insert(Log::default());
        world.register_resource::<Log>();

        schedule.add_system::<_, ()>("update", "a", Section::During, || -> () {
            panic!("boom");
        });
        schedule.add_system::<_, (ResMut<Log>,)>("update", "b", Section::During, |mut log: ResMut<Log>| {
            log.0.push("ran");
        });

        let errors = schedule.run_stage_catch("update", &mut world);
        assert!(errors.is_empty());
        let log = world.storage().resources().get::<Log>().unwrap();
        assert_eq!(log.0, vec!["ran"]);
    }

    use crate::ecs::resource::Resource;
    use crate::ecs::system::ResMut;

    #[derive(Default)]
    struct Log(Vec<&'static str>);
    impl Resource for Log {}
}
