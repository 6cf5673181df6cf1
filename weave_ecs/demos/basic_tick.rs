//! Spawns a few entities, runs a couple of systems across several ticks, and
//! prints the result. Run with `cargo run --example basic_tick`.

use weave_ecs::{
    Commands, Component, Query, Read, Res, ResMut, Resource, Section, WorldBuilder, Write,
};

#[derive(Debug)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug)]
struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {}

struct Enemy;
impl Component for Enemy {}

#[derive(Default)]
struct FrameCount(u32);
impl Resource for FrameCount {}

fn apply_velocity(query: Query<(Write<Position>, Read<Velocity>)>) {
    for (pos, vel) in query.iter() {
        pos.x += vel.dx;
        pos.y += vel.dy;
    }
}

fn spawn_enemy_once(commands: Commands, frame: Res<FrameCount>) {
    if frame.0 == 1 {
        let enemy = commands.spawn();
        commands.add_component(enemy, Enemy).unwrap();
        commands
            .add_component(
                enemy,
                Position {
                    x: -10.0,
                    y: 0.0,
                },
            )
            .unwrap();
    }
}

fn count_enemies(query: Query<(Read<Enemy>,)>) {
    println!("  enemies alive: {}", query.len());
}

fn advance_frame(mut frame: ResMut<FrameCount>) {
    frame.0 += 1;
}

fn main() {
    env_logger::init();

    let mut world = WorldBuilder::new().max_entities(64).build();
    world.register_component::<Position>();
    world.register_component::<Velocity>();
    world.register_component::<Enemy>();
    world.insert_resource(FrameCount::default());

    let player = world.spawn();
    world
        .add_component(player, Position { x: 0.0, y: 0.0 })
        .unwrap();
    world
        .add_component(player, Velocity { dx: 1.0, dy: 0.5 })
        .unwrap();

    world.add_system::<_, (Query<(Write<Position>, Read<Velocity>)>,)>("update", "movement", Section::During, apply_velocity);
    world.add_system::<_, (Commands, Res<FrameCount>)>("update", "spawner", Section::During, spawn_enemy_once);
    world.add_system::<_, (Query<(Read<Enemy>,)>,)>("update", "census", Section::After, count_enemies);
    world.add_system::<_, (ResMut<FrameCount>,)>("update", "advance_frame", Section::After, advance_frame);

    world.init().expect("init stage should not fail");
    for frame in 0..3 {
        println!("frame {frame}");
        world.tick().expect("tick should not fail");
        let pos = world.get_component::<Position>(player).unwrap();
        println!("  player at ({:.1}, {:.1})", pos.x, pos.y);
    }
    world.deinit();
}
