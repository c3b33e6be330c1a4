use std::time::Duration;

use gridforge_core::{
    BeltState, BuildingKind, Command, Direction, EntityId, Event, GridPosition, ItemId, OreKind,
    TransferTarget,
};
use gridforge_world::{self as world, query, World};

#[test]
fn belt_holds_a_single_item() {
    let mut world = World::new();
    let belt = place(&mut world, BuildingKind::Belt, (4, 4), Direction::East);

    let mut events = Vec::new();
    for ore in [OreKind::Blue, OreKind::Red] {
        world::apply(&mut world, Command::PlaceItemOnBelt { belt, ore }, &mut events);
    }

    let placed: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::ItemPlaced { .. }))
        .collect();
    assert_eq!(placed.len(), 1, "second item must be rejected");
    assert_eq!(query::item_count(&world), 1);

    let snapshot = *query::belt_view(&world).get(belt).expect("belt registered");
    assert!(snapshot.space_taken);
    assert_eq!(snapshot.state, BeltState::Carrying);
}

#[test]
fn items_travel_along_belts_into_a_collector() {
    let mut world = World::new();
    let first = place(&mut world, BuildingKind::Belt, (2, 5), Direction::East);
    let second = place(&mut world, BuildingKind::Belt, (3, 5), Direction::East);
    let third = place(&mut world, BuildingKind::Belt, (4, 5), Direction::East);
    let collector = place(&mut world, BuildingKind::Collector, (5, 5), Direction::North);

    let item = place_item(&mut world, first, OreKind::Yellow);
    let events = tick(&mut world, 30);

    let transfers: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::ItemTransferred { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(transfers, vec![(first, second), (second, third)]);
    assert!(events.contains(&Event::ItemCollected {
        item,
        ore: OreKind::Yellow,
        belt: third,
        collector,
    }));
    assert_eq!(query::ledger(&world).total(OreKind::Yellow), 1);
    assert_eq!(query::item_count(&world), 0);
    for snapshot in query::belt_view(&world).iter() {
        assert_eq!(snapshot.state, BeltState::Idle);
        assert!(!snapshot.is_reserved());
    }
}

#[test]
fn only_one_upstream_belt_reserves_a_slot() {
    let mut world = World::new();
    let shared = place(&mut world, BuildingKind::Belt, (3, 5), Direction::East);
    let from_south = place(&mut world, BuildingKind::Belt, (3, 4), Direction::North);
    let from_west = place(&mut world, BuildingKind::Belt, (2, 5), Direction::East);

    let south_item = place_item(&mut world, from_south, OreKind::Blue);
    let west_item = place_item(&mut world, from_west, OreKind::Red);

    let _ = tick(&mut world, 1);
    let view = query::belt_view(&world);
    assert_eq!(view.get(shared).and_then(|belt| belt.reserved_by), Some(from_south));
    assert_eq!(
        view.get(from_south).map(|belt| belt.state),
        Some(BeltState::Transferring {
            target: TransferTarget::Belt(shared),
        })
    );
    assert_eq!(view.get(from_west).map(|belt| belt.state), Some(BeltState::Blocked));

    let _ = tick(&mut world, 20);
    let view = query::belt_view(&world);
    assert_eq!(view.get(shared).and_then(|belt| belt.carried), Some(south_item));
    assert_eq!(view.get(from_west).and_then(|belt| belt.carried), Some(west_item));
    assert_eq!(view.get(from_west).map(|belt| belt.state), Some(BeltState::Blocked));
    assert!(view.get(shared).is_some_and(|belt| !belt.is_reserved()));
}

#[test]
fn reserved_belts_reject_new_items() {
    let mut world = World::new();
    let downstream = place(&mut world, BuildingKind::Belt, (6, 2), Direction::East);
    let upstream = place(&mut world, BuildingKind::Belt, (5, 2), Direction::East);
    let _ = place_item(&mut world, upstream, OreKind::Blue);
    let _ = tick(&mut world, 1);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceItemOnBelt {
            belt: downstream,
            ore: OreKind::Red,
        },
        &mut events,
    );
    assert!(events.is_empty(), "reserved slot must stay free for the transfer");
}

#[test]
fn destroying_the_source_mid_transfer_frees_the_reservation() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (2, 2), Direction::North);
    let target = place(&mut world, BuildingKind::Belt, (2, 3), Direction::North);
    let item = place_item(&mut world, source, OreKind::Blue);
    let _ = tick(&mut world, 2);
    assert!(query::belt_view(&world)
        .get(target)
        .is_some_and(|belt| belt.reserved_by == Some(source)));

    let mut events = Vec::new();
    world::apply(&mut world, Command::RemoveBuilding { entity: source }, &mut events);

    assert!(events.contains(&Event::ItemDiscarded {
        item,
        belt: Some(source),
    }));
    let view = query::belt_view(&world);
    assert!(view.get(source).is_none());
    assert!(view.get(target).is_some_and(|belt| !belt.is_reserved()));
    assert_eq!(query::item_count(&world), 0);
}

#[test]
fn destroying_the_target_returns_the_source_to_carrying() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (2, 2), Direction::North);
    let target = place(&mut world, BuildingKind::Belt, (2, 3), Direction::North);
    let item = place_item(&mut world, source, OreKind::Blue);
    let _ = tick(&mut world, 2);

    let mut events = Vec::new();
    world::apply(&mut world, Command::RemoveBuilding { entity: target }, &mut events);

    let view = query::belt_view(&world);
    let snapshot = view.get(source).expect("source survives");
    assert_eq!(snapshot.state, BeltState::Carrying);
    assert_eq!(snapshot.carried, Some(item));
    assert_eq!(snapshot.downstream, None);

    let _ = tick(&mut world, 1);
    let view = query::belt_view(&world);
    assert_eq!(view.get(source).map(|belt| belt.state), Some(BeltState::Blocked));
}

#[test]
fn destroying_an_item_mid_transfer_releases_the_reservation_immediately() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (7, 7), Direction::West);
    let target = place(&mut world, BuildingKind::Belt, (6, 7), Direction::West);
    let item = place_item(&mut world, source, OreKind::Red);
    let _ = tick(&mut world, 1);

    let mut events = Vec::new();
    world::apply(&mut world, Command::DestroyItem { item }, &mut events);

    assert_eq!(
        events,
        vec![Event::ItemDiscarded {
            item,
            belt: Some(source),
        }]
    );
    let view = query::belt_view(&world);
    assert!(view.get(target).is_some_and(|belt| !belt.is_reserved()));
    let snapshot = view.get(source).expect("source survives");
    assert_eq!(snapshot.state, BeltState::Idle);
    assert!(snapshot.accepts_items());
}

#[test]
fn paused_belts_hold_items_but_still_receive() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (3, 8), Direction::East);
    let paused = place(&mut world, BuildingKind::Belt, (4, 8), Direction::East);
    let _ = place(&mut world, BuildingKind::Belt, (5, 8), Direction::East);

    let mut events = Vec::new();
    world::apply(&mut world, Command::PauseBelt { belt: paused }, &mut events);
    let item = place_item(&mut world, source, OreKind::Blue);
    let _ = tick(&mut world, 20);

    let view = query::belt_view(&world);
    let snapshot = view.get(paused).expect("paused belt exists");
    assert!(snapshot.paused);
    assert_eq!(snapshot.carried, Some(item));
    let resting = query::item_position(&world, item).expect("item alive");
    assert!((resting.x - 4.0).abs() < 1e-3, "item must rest on the paused belt");

    let _ = tick(&mut world, 5);
    assert_eq!(query::item_position(&world, item), Some(resting));

    world::apply(&mut world, Command::ResumeBelt { belt: paused }, &mut events);
    let events = tick(&mut world, 10);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ItemTransferred { from, .. } if *from == paused
    )));
}

#[test]
fn rotating_a_transferring_belt_cancels_the_transfer() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (5, 5), Direction::East);
    let target = place(&mut world, BuildingKind::Belt, (6, 5), Direction::East);
    let _ = place_item(&mut world, source, OreKind::Yellow);
    let _ = tick(&mut world, 1);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RotateBuilding {
            entity: source,
            facing: Direction::South,
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BuildingRotated {
            entity: source,
            facing: Direction::South,
        }]
    );
    let view = query::belt_view(&world);
    assert!(view.get(target).is_some_and(|belt| !belt.is_reserved()));
    assert_eq!(view.get(source).map(|belt| belt.state), Some(BeltState::Carrying));
}

#[test]
fn belts_facing_open_ground_resolve_no_downstream() {
    let mut world = World::new();
    let belt = place(&mut world, BuildingKind::Belt, (3, 3), Direction::East);
    let _ = place_item(&mut world, belt, OreKind::Red);
    let _ = tick(&mut world, 1);

    let snapshot = *query::belt_view(&world).get(belt).expect("belt registered");
    assert_eq!(snapshot.state, BeltState::Blocked);
    assert_eq!(snapshot.downstream, None);

    let _ = place(&mut world, BuildingKind::Turret, (4, 3), Direction::North);
    let _ = tick(&mut world, 1);

    let snapshot = *query::belt_view(&world).get(belt).expect("belt registered");
    assert_eq!(snapshot.state, BeltState::Blocked);
    assert_eq!(snapshot.downstream, None, "turrets accept no items");
}

#[test]
fn a_neighbour_placed_and_removed_only_triggers_a_recompute() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (2, 6), Direction::East);
    let item = place_item(&mut world, source, OreKind::Blue);
    let _ = tick(&mut world, 1);

    let turret = place(&mut world, BuildingKind::Turret, (3, 6), Direction::North);
    let mut events = Vec::new();
    world::apply(&mut world, Command::RemoveBuilding { entity: turret }, &mut events);
    let _ = tick(&mut world, 1);

    let snapshot = *query::belt_view(&world).get(source).expect("source survives");
    assert_eq!(snapshot.state, BeltState::Blocked);
    assert_eq!(snapshot.downstream, None);
    assert_eq!(snapshot.carried, Some(item));

    let next = place(&mut world, BuildingKind::Belt, (3, 6), Direction::East);
    let collector = place(&mut world, BuildingKind::Collector, (4, 6), Direction::North);
    let _ = tick(&mut world, 1);
    let snapshot = *query::belt_view(&world).get(source).expect("source survives");
    assert_eq!(snapshot.downstream, Some(GridPosition::new(3, 6)));
    assert_eq!(
        snapshot.state,
        BeltState::Transferring {
            target: TransferTarget::Belt(next),
        }
    );

    let events = tick(&mut world, 30);
    assert!(events.contains(&Event::ItemCollected {
        item,
        ore: OreKind::Blue,
        belt: next,
        collector,
    }));
    assert_eq!(query::ledger(&world).total(OreKind::Blue), 1);
}

#[test]
fn removing_a_collector_mid_transfer_reverts_the_feeding_belt() {
    let mut world = World::new();
    let source = place(&mut world, BuildingKind::Belt, (6, 5), Direction::North);
    let collector = place(&mut world, BuildingKind::Collector, (6, 6), Direction::North);
    let item = place_item(&mut world, source, OreKind::Yellow);
    let _ = tick(&mut world, 1);
    assert_eq!(
        query::belt_view(&world).get(source).map(|belt| belt.state),
        Some(BeltState::Transferring {
            target: TransferTarget::Collector(collector),
        })
    );

    let mut events = Vec::new();
    world::apply(&mut world, Command::RemoveBuilding { entity: collector }, &mut events);
    let snapshot = *query::belt_view(&world).get(source).expect("source survives");
    assert_eq!(snapshot.state, BeltState::Carrying);
    assert_eq!(snapshot.downstream, None);
    assert_eq!(snapshot.carried, Some(item));

    let _ = tick(&mut world, 1);
    let snapshot = *query::belt_view(&world).get(source).expect("source survives");
    assert_eq!(snapshot.state, BeltState::Blocked);
    assert_eq!(snapshot.downstream, None);

    let replacement = place(&mut world, BuildingKind::Collector, (6, 6), Direction::North);
    let events = tick(&mut world, 20);

    assert!(events.contains(&Event::ItemCollected {
        item,
        ore: OreKind::Yellow,
        belt: source,
        collector: replacement,
    }));
    assert_eq!(query::ledger(&world).total(OreKind::Yellow), 1);
    assert_eq!(query::item_count(&world), 0);
}

fn place(world: &mut World, kind: BuildingKind, (x, y): (i32, i32), facing: Direction) -> EntityId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceBuilding {
            kind,
            origin: GridPosition::new(x, y),
            facing,
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

fn place_item(world: &mut World, belt: EntityId, ore: OreKind) -> ItemId {
    let mut events = Vec::new();
    world::apply(world, Command::PlaceItemOnBelt { belt, ore }, &mut events);
    events
        .iter()
        .find_map(|event| match event {
            Event::ItemPlaced { item, .. } => Some(*item),
            _ => None,
        })
        .expect("item placed")
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
