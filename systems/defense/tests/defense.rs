use std::time::Duration;

use gridforge_core::{
    BuildingKind, Command, Direction, EnemyId, EnemyProfile, EntityId, Event, GridPosition, Route,
};
use gridforge_system_defense::{Config, Defense, ElectricConfig, TurretConfig};
use gridforge_world::{self as world, query, World};

#[test]
fn turrets_prefer_the_enemy_furthest_along_its_route() {
    let mut world = World::new();
    let turret = place(&mut world, BuildingKind::Turret, (5, 5));
    let idle = place(&mut world, BuildingKind::EnemySpawner, (3, 5));
    let walker = place(&mut world, BuildingKind::EnemySpawner, (7, 3));
    let _ = place(&mut world, BuildingKind::Belt, (8, 4));
    assign(&mut world, walker, &[(7, 4), (8, 4), (9, 4)]);
    let near = spawn(&mut world, idle, stationary(100.0));
    let ahead = spawn(&mut world, walker, EnemyProfile::default());
    advance(&mut world, 12);
    let mut defense = Defense::default();

    let events = run(&mut world, &mut defense, 1);

    assert_eq!(defense.target_of(turret), Some(ahead));
    assert_eq!(damaged(&events), vec![ahead]);
    assert_eq!(health_of(&world, near), Some(100.0));
}

#[test]
fn turrets_fire_at_their_configured_rate() {
    let mut world = World::new();
    let _ = place(&mut world, BuildingKind::Turret, (5, 5));
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (3, 5));
    let enemy = spawn(&mut world, spawner, stationary(1_000.0));
    let mut defense = Defense::default();

    let events = run(&mut world, &mut defense, 20);

    assert_eq!(damaged(&events).len(), 3);
    assert_eq!(health_of(&world, enemy), Some(940.0));
}

#[test]
fn turrets_ignore_enemies_out_of_range() {
    let mut world = World::new();
    let turret = place(&mut world, BuildingKind::Turret, (1, 1));
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (8, 8));
    let _ = spawn(&mut world, spawner, stationary(100.0));
    let mut defense = Defense::default();

    let events = run(&mut world, &mut defense, 10);

    assert!(damaged(&events).is_empty());
    assert_eq!(defense.target_of(turret), None);
}

#[test]
fn targets_leaving_range_are_released_before_the_next_retarget() {
    let mut world = World::new();
    let turret = place(&mut world, BuildingKind::Turret, (1, 5));
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (2, 5));
    let _ = place(&mut world, BuildingKind::Belt, (8, 5));
    assign(
        &mut world,
        spawner,
        &[(3, 5), (4, 5), (5, 5), (6, 5), (7, 5), (8, 5), (9, 5)],
    );
    let runner = spawn(
        &mut world,
        spawner,
        EnemyProfile {
            max_health: 10_000.0,
            ..EnemyProfile::default()
        },
    );
    let mut defense = Defense::new(Config {
        turret: TurretConfig {
            retarget_ms: 60_000,
            ..TurretConfig::default()
        },
        ..Config::default()
    });

    let events = run(&mut world, &mut defense, 40);
    assert!(damaged(&events).contains(&runner));
    assert_eq!(defense.target_of(turret), None);

    let events = run(&mut world, &mut defense, 30);

    assert!(damaged(&events).is_empty());
    assert_eq!(defense.target_of(turret), None);
}

#[test]
fn dead_targets_are_released() {
    let mut world = World::new();
    let turret = place(&mut world, BuildingKind::Turret, (5, 5));
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (4, 5));
    let enemy = spawn(&mut world, spawner, stationary(20.0));
    let mut defense = Defense::default();

    let events = run(&mut world, &mut defense, 2);

    assert!(events.contains(&Event::EnemyDefeated { enemy, spawner }));
    assert_eq!(defense.target_of(turret), None);
}

#[test]
fn electric_towers_arc_every_enemy_in_range_twice_a_second() {
    let mut world = World::new();
    let _ = place(&mut world, BuildingKind::ElectricTower, (5, 5));
    let west = place(&mut world, BuildingKind::EnemySpawner, (3, 5));
    let north = place(&mut world, BuildingKind::EnemySpawner, (5, 8));
    let corner = place(&mut world, BuildingKind::EnemySpawner, (9, 9));
    let plain = spawn(&mut world, west, stationary(100.0));
    let armored = spawn(
        &mut world,
        north,
        EnemyProfile {
            armored: true,
            ..stationary(100.0)
        },
    );
    let distant = spawn(&mut world, corner, stationary(100.0));
    let mut defense = Defense::new(Config {
        electric: ElectricConfig {
            range: 4.0,
            ..ElectricConfig::default()
        },
        ..Config::default()
    });

    let events = run(&mut world, &mut defense, 4);
    assert!(damaged(&events).is_empty(), "still charging");

    let events = run(&mut world, &mut defense, 6);

    assert_eq!(damaged(&events), vec![plain, armored, plain, armored]);
    assert_eq!(health_of(&world, plain), Some(80.0));
    assert_eq!(health_of(&world, armored), Some(90.0));
    assert_eq!(health_of(&world, distant), Some(100.0));
}

#[test]
fn removed_towers_stop_firing() {
    let mut world = World::new();
    let turret = place(&mut world, BuildingKind::Turret, (5, 5));
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (3, 5));
    let enemy = spawn(&mut world, spawner, stationary(1_000.0));
    let mut defense = Defense::default();
    let _ = run(&mut world, &mut defense, 1);
    assert_eq!(defense.target_of(turret), Some(enemy));

    let mut events = Vec::new();
    world::apply(&mut world, Command::RemoveBuilding { entity: turret }, &mut events);
    let events = run(&mut world, &mut defense, 20);

    assert!(damaged(&events).is_empty());
    assert_eq!(defense.target_of(turret), None);
}

fn stationary(max_health: f32) -> EnemyProfile {
    EnemyProfile {
        max_health,
        speed: 0.0,
        ..EnemyProfile::default()
    }
}

fn place(world: &mut World, kind: BuildingKind, (x, y): (i32, i32)) -> EntityId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceBuilding {
            kind,
            origin: GridPosition::new(x, y),
            facing: Direction::North,
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::BuildingPlaced { entity, .. } => Some(*entity),
            _ => None,
        })
        .expect("building placed")
}

fn assign(world: &mut World, spawner: EntityId, cells: &[(i32, i32)]) {
    let route = Route::new(
        cells
            .iter()
            .map(|(x, y)| GridPosition::new(*x, *y))
            .collect(),
    );
    let mut events = Vec::new();
    world::apply(
        world,
        Command::AssignRoute {
            spawner,
            route: Some(route),
        },
        &mut events,
    );
}

fn spawn(world: &mut World, spawner: EntityId, profile: EnemyProfile) -> EnemyId {
    let mut events = Vec::new();
    world::apply(world, Command::SpawnEnemy { spawner, profile }, &mut events);
    events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("enemy spawned")
}

fn health_of(world: &World, enemy: EnemyId) -> Option<f32> {
    query::enemy_view(world)
        .iter()
        .find(|snapshot| snapshot.id == enemy)
        .map(|snapshot| snapshot.health)
}

fn damaged(events: &[Event]) -> Vec<EnemyId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect()
}

fn advance(world: &mut World, ticks: usize) {
    let mut events = Vec::new();
    for _ in 0..ticks {
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
    }
}

fn run(world: &mut World, defense: &mut Defense, ticks: usize) -> Vec<Event> {
    let mut recorded = Vec::new();
    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );

        let mut commands = Vec::new();
        defense.handle(
            &events,
            &query::building_view(world),
            &query::enemy_view(world),
            &mut commands,
        );
        for command in commands {
            world::apply(world, command, &mut events);
        }
        recorded.extend(events);
    }
    recorded
}
