use std::time::Duration;

use gridforge_core::{
    BuildingKind, Command, Direction, EnemyId, EnemyProfile, EntityId, Event, GridPosition, Route,
    SpawnerError,
};
use gridforge_world::{self as world, query, Config, World};

#[test]
fn enemies_walk_their_route_and_damage_the_core() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (3, 0));
    assign(&mut world, spawner, &[(2, 0), (1, 0), (0, 0)]);
    let enemy = spawn(
        &mut world,
        spawner,
        EnemyProfile {
            damage_to_base: 3,
            ..EnemyProfile::default()
        },
    );

    let events = tick(&mut world, 40);

    assert!(events.contains(&Event::EnemyReachedCore {
        enemy,
        damage: 3,
        integrity: 17,
    }));
    assert!(query::enemy_view(&world).is_empty());
    assert_eq!(query::core_integrity(&world), 17);
}

#[test]
fn core_destruction_is_announced_once() {
    let mut world = World::with_config(Config {
        core_integrity: 1,
        ..Config::default()
    });
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (1, 0));
    assign(&mut world, spawner, &[(0, 0)]);
    let _ = spawn(&mut world, spawner, EnemyProfile::default());
    let _ = spawn(&mut world, spawner, EnemyProfile::default());

    let events = tick(&mut world, 20);

    let destroyed = events
        .iter()
        .filter(|event| matches!(event, Event::CoreDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 1);
    assert_eq!(query::core_integrity(&world), 0);
}

#[test]
fn enemies_wait_in_front_of_blocked_waypoints() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (3, 0));
    assign(&mut world, spawner, &[(2, 0), (1, 0), (0, 0)]);
    let enemy = spawn(&mut world, spawner, EnemyProfile::default());
    let _ = place(&mut world, BuildingKind::Turret, (2, 0));

    let _ = tick(&mut world, 20);

    let view = query::enemy_view(&world);
    let snapshot = view
        .iter()
        .find(|snapshot| snapshot.id == enemy)
        .expect("enemy alive");
    assert_eq!(snapshot.cell, GridPosition::new(3, 0));
    assert_eq!(snapshot.path_index, 0);
}

#[test]
fn armored_enemies_take_half_damage_until_defeated() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (6, 6));
    let enemy = spawn(
        &mut world,
        spawner,
        EnemyProfile {
            max_health: 20.0,
            armored: true,
            ..EnemyProfile::default()
        },
    );

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::DamageEnemy {
            enemy,
            amount: 10.0,
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::EnemyDamaged {
            enemy,
            amount: 5.0,
            remaining: 15.0,
        }]
    );

    events.clear();
    world::apply(
        &mut world,
        Command::DamageEnemy {
            enemy,
            amount: 30.0,
        },
        &mut events,
    );
    assert_eq!(
        events.last(),
        Some(&Event::EnemyDefeated { enemy, spawner })
    );
    assert!(query::enemy_view(&world).is_empty());
}

#[test]
fn mines_detonate_under_enemies() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (3, 0));
    let mine = place(&mut world, BuildingKind::LandMine, (2, 0));
    assign(&mut world, spawner, &[(2, 0), (1, 0), (0, 0)]);
    let enemy = spawn(&mut world, spawner, EnemyProfile::default());

    let events = tick(&mut world, 12);

    assert!(events.contains(&Event::MineDetonated {
        mine,
        cell: GridPosition::new(2, 0),
        affected: 1,
    }));
    assert!(events.contains(&Event::EnemyDamaged {
        enemy,
        amount: 25.0,
        remaining: 75.0,
    }));
    assert_eq!(query::building_count(&world, BuildingKind::LandMine), 0);
}

#[test]
fn missing_routes_flag_the_spawner_and_keep_the_last_route() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (2, 0));
    assign(&mut world, spawner, &[(1, 0), (0, 0)]);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AssignRoute {
            spawner,
            route: None,
        },
        &mut events,
    );

    assert_eq!(events, vec![Event::PathBlocked { spawner }]);
    let snapshot = query::spawner_view(&world)
        .into_iter()
        .find(|snapshot| snapshot.id == spawner)
        .expect("spawner exists");
    assert!(snapshot.path_blocked);
    assert_eq!(snapshot.route.map(|route| route.len()), Some(2));
}

#[test]
fn wave_counter_advances_only_after_completion() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (8, 8));
    let mut events = Vec::new();

    world::apply(&mut world, Command::BeginWave { spawner }, &mut events);
    world::apply(&mut world, Command::BeginWave { spawner }, &mut events);
    assert_eq!(events, vec![Event::WaveStarted { spawner, wave: 1 }]);
    assert_eq!(wave_of(&world, spawner), Some(1));

    events.clear();
    world::apply(&mut world, Command::CompleteWave { spawner }, &mut events);
    world::apply(&mut world, Command::CompleteWave { spawner }, &mut events);
    assert_eq!(events, vec![Event::WaveCompleted { spawner, wave: 1 }]);
    assert_eq!(wave_of(&world, spawner), Some(2));
}

#[test]
fn stepping_spawners_bulldoze_buildings_but_not_the_core() {
    let mut world = World::new();
    let spawner = place(&mut world, BuildingKind::EnemySpawner, (1, 1));
    let belt = place(&mut world, BuildingKind::Belt, (1, 2));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(1, 2),
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![
            Event::BuildingRemoved {
                entity: belt,
                kind: BuildingKind::Belt,
                origin: GridPosition::new(1, 2),
            },
            Event::SpawnerMoved {
                spawner,
                from: GridPosition::new(1, 1),
                to: GridPosition::new(1, 2),
            },
        ]
    );
    assert!(query::cell(&world, GridPosition::new(1, 1)).is_some_and(|cell| !cell.is_occupied()));

    events.clear();
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(1, 4),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(0, 2),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(0, 2),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(0, 1),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::StepSpawner {
            spawner,
            to: GridPosition::new(0, 0),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            Event::SpawnerStepRejected {
                spawner,
                reason: SpawnerError::NotAdjacent,
            },
            Event::SpawnerMoved {
                spawner,
                from: GridPosition::new(1, 2),
                to: GridPosition::new(0, 2),
            },
            Event::SpawnerStepRejected {
                spawner,
                reason: SpawnerError::NotAdjacent,
            },
            Event::SpawnerMoved {
                spawner,
                from: GridPosition::new(0, 2),
                to: GridPosition::new(0, 1),
            },
            Event::SpawnerStepRejected {
                spawner,
                reason: SpawnerError::Blocked,
            },
        ]
    );
    assert_eq!(query::core_position(&world), Some(GridPosition::ORIGIN));
}

#[test]
fn merging_fuses_spawners_at_the_partner_cell() {
    let mut world = World::new();
    let mover = place(&mut world, BuildingKind::EnemySpawner, (5, 5));
    let partner = place(&mut world, BuildingKind::EnemySpawner, (6, 5));
    for _ in 0..2 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::BeginWave { spawner: mover }, &mut events);
        world::apply(&mut world, Command::CompleteWave { spawner: mover }, &mut events);
    }
    let enemy = spawn(&mut world, mover, EnemyProfile::default());

    let mut events = Vec::new();
    world::apply(&mut world, Command::MergeSpawners { mover, partner }, &mut events);

    let merged = events
        .iter()
        .find_map(|event| match event {
            Event::SpawnersMerged {
                merged,
                cell,
                scale,
                ..
            } => {
                assert_eq!(*cell, GridPosition::new(6, 5));
                assert_eq!(*scale, 1.5);
                Some(*merged)
            }
            _ => None,
        })
        .expect("spawners merged");

    let spawners = query::spawner_view(&world);
    assert_eq!(spawners.len(), 1);
    assert_eq!(spawners[0].id, merged);
    assert_eq!(spawners[0].wave, 3);
    assert_eq!(spawners[0].active_enemies, 1);
    assert!(query::cell(&world, GridPosition::new(5, 5)).is_some_and(|cell| !cell.is_occupied()));
    assert!(query::enemy_view(&world)
        .iter()
        .any(|snapshot| snapshot.id == enemy && snapshot.spawner == merged));
}

#[test]
fn merging_requires_adjacent_spawners() {
    let mut world = World::new();
    let mover = place(&mut world, BuildingKind::EnemySpawner, (2, 5));
    let partner = place(&mut world, BuildingKind::EnemySpawner, (6, 5));

    let mut events = Vec::new();
    world::apply(&mut world, Command::MergeSpawners { mover, partner }, &mut events);

    assert_eq!(
        events,
        vec![Event::MergeRejected {
            mover,
            partner,
            reason: SpawnerError::NotAdjacent,
        }]
    );
    assert_eq!(query::spawner_view(&world).len(), 2);
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

fn wave_of(world: &World, spawner: EntityId) -> Option<u32> {
    query::spawner_view(world)
        .into_iter()
        .find(|snapshot| snapshot.id == spawner)
        .map(|snapshot| snapshot.wave)
}

fn tick(world: &mut World, count: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..count {
        world::apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
    }
    events
}
