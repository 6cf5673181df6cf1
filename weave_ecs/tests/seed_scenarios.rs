//! End-to-end scenarios exercising world, scheduler, and query engine
//! together, the way a single source file's unit tests cannot.

use weave_ecs::{
    Commands, Component, Entity, Event, EventReader, Query, Read, Res, ResMut, Resource, Section,
    With, Without, World, WorldBuilder, Write,
};

struct Position(i32);
impl Component for Position {}

struct Speed(i32);
impl Component for Speed {}

fn world() -> World {
    WorldBuilder::new().max_entities(16).build()
}

// Scenario 1: basic tick.
#[test]
fn basic_tick_advances_position_by_speed_each_run() {
    let mut world = world();
    world.register_component::<Position>();
    world.register_component::<Speed>();
    let e = world.spawn();
    world.add_component(e, Position(0)).unwrap();
    world.add_component(e, Speed(100)).unwrap();

    world.add_system::<_, (Query<(Write<Position>, Read<Speed>)>,)>(
        "update",
        "movement",
        Section::During,
        |query: Query<(Write<Position>, Read<Speed>)>| {
            for (pos, speed) in query.iter() {
                pos.0 += speed.0;
            }
        },
    );

    world.run_stage("update").unwrap();
    assert_eq!(world.get_component::<Position>(e).unwrap().0, 100);

    world.run_stage("update").unwrap();
    assert_eq!(world.get_component::<Position>(e).unwrap().0, 200);
}

// Scenario 2: query filtering with with/without.
struct Name(&'static str);
impl Component for Name {}
struct Transform;
impl Component for Transform {}
struct MyComp;
impl Component for MyComp {}

#[test]
fn query_filtering_matches_only_entities_satisfying_with_and_without() {
    let mut world = world();
    world.register_component::<MyComp>();
    world.register_component::<Name>();
    world.register_component::<Transform>();

    let a = world.spawn();
    world.add_component(a, MyComp).unwrap();
    world.add_component(a, Name("a")).unwrap();

    let b = world.spawn();
    world.add_component(b, MyComp).unwrap();
    world.add_component(b, Transform).unwrap();
    world.add_component(b, Name("b")).unwrap();

    let c = world.spawn();
    world.add_component(c, MyComp).unwrap();

    let query: Query<(Read<MyComp>,), (With<Name>, Without<Transform>)> =
        Query::new(world.storage(), world.registry()).unwrap();
    let matches: Vec<Entity> = query.iter_with_entity().map(|(e, _)| e).collect();

    assert_eq!(matches, vec![a]);
}

// Scenario 3: deferred give is invisible within the issuing system, visible next stage.
struct Marker;
impl Component for Marker {}

#[test]
fn commands_add_component_is_invisible_until_the_next_system() {
    let mut world = world();
    world.register_component::<Marker>();
    let e = world.spawn();

    world.add_system::<_, (Commands,)>(
        "update",
        "give",
        Section::During,
        move |commands: Commands| {
            commands.add_component(e, Marker).unwrap();
            assert!(!commands.has_component::<Marker>(e));
        },
    );
    world.add_system::<_, (Query<(Read<Marker>,)>,)>(
        "update",
        "observe",
        Section::After,
        move |query: Query<(Read<Marker>,)>| {
            assert_eq!(query.len(), 1);
        },
    );

    world.run_stage("update").unwrap();
    assert!(world.has_component::<Marker>(e));
}

// Scenario 4: hierarchy despawn removes every descendant.
#[test]
fn despawning_root_cascades_to_every_descendant() {
    let mut world = world();
    let root = world.spawn();
    let child1 = world.spawn();
    let child2 = world.spawn();
    let grandchild = world.spawn();
    world.set_parent(child1, Some(root)).unwrap();
    world.set_parent(child2, Some(root)).unwrap();
    world.set_parent(grandchild, Some(child1)).unwrap();

    world.despawn(root);

    for entity in [root, child1, child2, grandchild] {
        assert!(!world.is_live(entity));
    }
}

// Scenario 5: event ordering, FIFO per reader, independent cursors across readers.
struct Hit(u32);
impl Event for Hit {}

#[test]
fn events_are_read_in_order_across_stages() {
    use std::cell::RefCell;
    use std::rc::Rc;
    use weave_ecs::{EventReceiver, EventWriter};

    let mut world = world();
    world.register_event::<Hit>();
    world.insert_resource(EventReader::<Hit>::new());

    world.add_system::<_, (EventWriter<Hit>,)>("update", "send", Section::Before, |mut hits: EventWriter<Hit>| {
        hits.send(Hit(1));
        hits.send(Hit(2));
    });

    let seen: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    world.add_system::<_, (EventReceiver<Hit>,)>("update", "observe", Section::After, {
        let seen = seen.clone();
        move |mut hits: EventReceiver<Hit>| {
            seen.borrow_mut()
                .extend(hits.read().iter().map(|h| h.0));
        }
    });

    world.run_stage("update").unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2]);

    // Published directly before the stage runs, so it is older than the
    // "send" system's events but still unread by "observe" until this pass.
    world.publish_event(Hit(3));
    world.run_stage("update").unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2, 3, 1, 2]);
}

// Scenario 6: overflow policy recycles the first-spawned entity.
#[test]
fn overwrite_first_policy_recycles_the_original_entity_at_capacity() {
    use weave_ecs::OverflowPolicy;

    let mut world = WorldBuilder::new()
        .max_entities(3)
        .overflow_policy(OverflowPolicy::OverwriteFirst)
        .build();
    world.register_component::<Position>();

    let first = world.spawn();
    world.add_component(first, Position(1)).unwrap();
    let second = world.spawn();
    let third = world.spawn();

    let fourth = world.spawn();

    assert_eq!(fourth, first);
    assert!(!world.has_component::<Position>(fourth));
    assert!(world.is_live(second));
    assert!(world.is_live(third));
}

#[test]
fn resources_are_shared_and_mutable_across_systems() {
    #[derive(Default)]
    struct Counter(u32);
    impl Resource for Counter {}

    let mut world = world();
    world.insert_resource(Counter::default());
    world.register_resource::<Counter>();

    world.add_system::<_, (ResMut<Counter>,)>("update", "increment", Section::During, |mut counter: ResMut<Counter>| {
        counter.0 += 1;
    });
    world.add_system::<_, (Res<Counter>,)>("update", "observe", Section::After, |counter: Res<Counter>| {
        assert_eq!(counter.0, 1);
    });

    world.run_stage("update").unwrap();
}
