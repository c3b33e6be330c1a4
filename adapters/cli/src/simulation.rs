//! Frame pump wiring the world to every system.

use std::{fmt, time::Duration};

use gridforge_core::{Command, Event, OreKind};
use gridforge_system_chunks::ChunkExpansion;
use gridforge_system_defense::Defense;
use gridforge_system_merging::SpawnerMerger;
use gridforge_system_pathfinding::Pathfinder;
use gridforge_system_production::Production;
use gridforge_system_waves::Waves;
use gridforge_world::{self as world, query, World};
use log::{debug, info, warn};

use crate::config::{Layout, Settings};

/// Owns the world and the systems reacting to its events.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    chunks: ChunkExpansion,
    pathfinder: Pathfinder,
    waves: Waves,
    production: Production,
    defense: Defense,
    merger: SpawnerMerger,
    pending: Vec<Event>,
}

impl Simulation {
    /// Builds the world, stamps the starting chunks and applies the layout.
    pub(crate) fn new(settings: &Settings) -> Self {
        let mut simulation = Self {
            world: World::with_config(settings.world),
            chunks: ChunkExpansion::new(settings.chunks),
            pathfinder: Pathfinder::new(),
            waves: Waves::new(settings.waves.clone()),
            production: Production::new(settings.production),
            defense: Defense::new(settings.defense),
            merger: SpawnerMerger::new(settings.merging),
            pending: Vec::new(),
        };

        let mut commands = Vec::new();
        match query::core_position(&simulation.world) {
            Some(core) => simulation.chunks.bootstrap(core, &mut commands),
            None => warn!("world has no core; skipping chunk bootstrap"),
        }
        simulation.execute(commands);
        simulation.apply_layout(&settings.layout);
        simulation
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Advances the world by `dt` and lets every system react.
    pub(crate) fn step(&mut self, dt: Duration) {
        let mut events = std::mem::take(&mut self.pending);
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let core = query::core_position(&self.world);
        let spawners = query::spawner_view(&self.world);
        let buildings = query::building_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        let mut commands = Vec::new();
        {
            let grid = query::grid_view(&self.world);
            self.pathfinder
                .handle(&events, &grid, core, &spawners, &enemies, &mut commands);
            self.production.handle(
                &events,
                &grid,
                &buildings,
                &query::belt_view(&self.world),
                &mut commands,
            );
            self.merger
                .handle(&events, &grid, core, &spawners, &mut commands);
        }
        self.waves.handle(
            &events,
            query::play_mode(&self.world),
            &spawners,
            &mut commands,
        );
        self.defense
            .handle(&events, &buildings, &enemies, &mut commands);
        self.chunks.handle(&events, core, &mut commands);

        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.pending);
        }
    }

    fn apply_layout(&mut self, layout: &Layout) {
        let mut commands = vec![Command::SetPlayMode {
            mode: layout.play_mode,
        }];
        commands.extend(layout.ore.iter().map(|mark| Command::SetOre {
            position: mark.position,
            ore: mark.ore,
        }));
        commands.extend(
            layout
                .buildings
                .iter()
                .map(|placement| Command::PlaceBuilding {
                    kind: placement.kind,
                    origin: placement.origin,
                    facing: placement.facing,
                }),
        );

        let start = self.pending.len();
        self.execute(commands);
        for event in &self.pending[start..] {
            if let Event::PlacementRejected { kind, origin, reason } = event {
                warn!(
                    "layout {kind:?} at ({}, {}) rejected: {reason}",
                    origin.x(),
                    origin.y()
                );
            }
        }
        debug!(
            "layout applied: {} ore marks, {} buildings",
            layout.ore.len(),
            layout.buildings.len()
        );
    }
}

/// End-of-run digest printed by the runner.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    ticks: u64,
    ore: Vec<(OreKind, u64)>,
    core_integrity: u32,
    spawners: usize,
    enemies: usize,
}

impl Summary {
    pub(crate) fn capture(world: &World) -> Self {
        let ledger = query::ledger(world);
        let summary = Self {
            ticks: query::tick_index(world),
            ore: OreKind::ALL
                .iter()
                .map(|ore| (*ore, ledger.total(*ore)))
                .collect(),
            core_integrity: query::core_integrity(world),
            spawners: query::spawner_view(world).len(),
            enemies: query::enemy_view(world).len(),
        };
        info!("{summary}");
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticks: {}", self.ticks)?;
        for (ore, total) in &self.ore {
            write!(f, ", {ore:?}: {total}")?;
        }
        write!(
            f,
            ", core integrity: {}, spawners: {}, enemies: {}",
            self.core_integrity, self.spawners, self.enemies
        )
    }
}
