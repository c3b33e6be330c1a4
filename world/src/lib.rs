#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridforge.
//!
//! The world owns the grid, every placed building, the belt network, items,
//! enemies and spawners. All mutation flows through [`apply`]; systems read
//! the state through the [`query`] module.

mod belts;
mod buildings;
mod enemies;
mod grid;
mod items;
mod ledger;
mod spawners;

use std::time::Duration;

use glam::Vec2;
use gridforge_core::{
    BuildingKind, Capability, Cell, Command, Direction, EnemyId, EnemyProfile, EntityId, Event,
    Footprint, GridFrame, GridPosition, Occupant, OreKind, PlacementError, PlayMode, RemovalError,
    Route, SpawnerError,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::{
    belts::{BeltNetwork, TransportContext, TransportParams},
    buildings::{BuildingRegistry, BuildingState},
    enemies::{Arrival, EnemyRoster},
    grid::Grid,
    items::ItemStore,
    spawners::{merged_scale, Spawner, SpawnerTable},
};

pub use ledger::Ledger;

/// Tunable parameters of the authoritative world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed interval between belt ticks, in milliseconds.
    pub belt_tick_ms: u64,
    /// Item travel speed along belts, in cells per second.
    pub belt_speed: f32,
    /// Distance under which a travelling item counts as arrived.
    pub transfer_epsilon: f32,
    /// Cell the core is placed on.
    pub core_position: GridPosition,
    /// Damage the core absorbs before it is destroyed.
    pub core_integrity: u32,
    /// Edge length of the square grid covered at start, anchored at the origin.
    pub initial_extent: i32,
    /// Blast radius of land mines, in cells.
    pub mine_radius: f32,
    /// Damage dealt by a land mine to each enemy within its radius.
    pub mine_damage: f32,
    /// Mapping from cells to world-space anchors.
    pub frame: GridFrame,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            belt_tick_ms: 100,
            belt_speed: 3.0,
            transfer_epsilon: 0.01,
            core_position: GridPosition::ORIGIN,
            core_integrity: 20,
            initial_extent: gridforge_core::CHUNK_SIZE,
            mine_radius: 3.0,
            mine_damage: 25.0,
            frame: GridFrame::default(),
        }
    }
}

impl Config {
    /// Fixed interval between belt ticks.
    #[must_use]
    pub const fn belt_tick(&self) -> Duration {
        Duration::from_millis(self.belt_tick_ms)
    }

    fn transport(&self) -> TransportParams {
        TransportParams {
            tick: self.belt_tick(),
            speed: self.belt_speed,
            epsilon: self.transfer_epsilon,
        }
    }
}

/// Represents the authoritative Gridforge world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    grid: Grid,
    buildings: BuildingRegistry,
    belts: BeltNetwork,
    items: ItemStore,
    enemies: EnemyRoster,
    spawners: SpawnerTable,
    ledger: Ledger,
    play_mode: PlayMode,
    core: Option<EntityId>,
    core_integrity: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a world covering the initial extent with the core in place.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let mut world = Self {
            config,
            grid: Grid::new(),
            buildings: BuildingRegistry::new(),
            belts: BeltNetwork::new(),
            items: ItemStore::new(),
            enemies: EnemyRoster::new(),
            spawners: SpawnerTable::new(),
            ledger: Ledger::default(),
            play_mode: PlayMode::default(),
            core: None,
            core_integrity: config.core_integrity,
            tick_index: 0,
        };

        let extent = config.initial_extent.max(0);
        for y in 0..extent {
            for x in 0..extent {
                let _ = world.grid.ensure_coverage(GridPosition::new(x, y));
            }
        }

        let mut discarded = Vec::new();
        if world
            .place_building(
                BuildingKind::Core,
                config.core_position,
                Direction::default(),
                &mut discarded,
            )
            .is_none()
        {
            error!("core could not be placed at {:?}", config.core_position);
        }
        world
    }

    fn cover(
        &mut self,
        positions: impl IntoIterator<Item = GridPosition>,
        out_events: &mut Vec<Event>,
    ) {
        let mut created = 0;
        for position in positions {
            if self.grid.ensure_coverage(position) {
                created += 1;
            }
        }
        if created > 0 {
            let (min_bounds, max_bounds) = self.grid.bounds();
            out_events.push(Event::GridExpanded {
                created,
                min_bounds,
                max_bounds,
            });
        }
    }

    fn place_building(
        &mut self,
        kind: BuildingKind,
        origin: GridPosition,
        facing: Direction,
        out_events: &mut Vec<Event>,
    ) -> Option<EntityId> {
        let footprint = kind.footprint();
        self.cover(footprint.cells(origin), out_events);

        if kind.has(Capability::Produce) && self.grid.cell(origin).and_then(Cell::ore).is_none()
        {
            out_events.push(Event::PlacementRejected {
                kind,
                origin,
                reason: PlacementError::MissingOre,
            });
            return None;
        }

        let entity = self.buildings.allocate();
        if let Err(reason) = self.grid.place(origin, Occupant { entity, kind }, footprint) {
            debug!("placement of {kind:?} at {origin:?} rejected: {reason}");
            out_events.push(Event::PlacementRejected {
                kind,
                origin,
                reason,
            });
            return None;
        }

        let state = BuildingState {
            entity,
            kind,
            origin,
            facing,
        };
        self.buildings.insert(state);
        if kind.has(Capability::Transport) {
            self.belts.register(entity, origin, facing);
        }
        if kind.has(Capability::Spawn) {
            self.spawners.insert(Spawner::new(entity, origin));
        }
        if kind.has(Capability::Goal) && self.core.is_none() {
            self.core = Some(entity);
        }
        self.belts.invalidate_where(|position| state.borders(position));

        out_events.push(Event::BuildingPlaced {
            entity,
            kind,
            origin,
            facing,
        });
        Some(entity)
    }

    fn remove_building(
        &mut self,
        entity: EntityId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), RemovalError> {
        let state = *self
            .buildings
            .get(entity)
            .ok_or(RemovalError::MissingBuilding)?;
        if !state.kind.is_destructible() {
            return Err(RemovalError::Indestructible);
        }

        let _ = self.grid.remove(state.origin);
        let _ = self.buildings.remove(entity);
        if state.kind.has(Capability::Transport) {
            self.belts.destroy(entity, &mut self.items, out_events);
        }
        if state.kind.has(Capability::Collect) {
            self.belts.revert_transfers_into(entity);
        }
        if state.kind.has(Capability::Spawn) {
            let _ = self.spawners.remove(entity);
        }
        self.belts.invalidate_where(|position| state.borders(position));

        out_events.push(Event::BuildingRemoved {
            entity,
            kind: state.kind,
            origin: state.origin,
        });
        Ok(())
    }

    fn rotate_building(&mut self, entity: EntityId, facing: Direction, out_events: &mut Vec<Event>) {
        let Some(state) = self.buildings.get_mut(entity) else {
            debug!("ignoring rotation of unknown building {}", entity.get());
            return;
        };
        state.facing = facing;
        let state = *state;

        if state.kind.has(Capability::Transport) {
            self.belts.rotate(entity, facing);
        }
        self.belts.invalidate_where(|position| state.borders(position));
        out_events.push(Event::BuildingRotated { entity, facing });
    }

    fn assign_route(
        &mut self,
        spawner: EntityId,
        route: Option<Route>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.spawners.get_mut(spawner) else {
            debug!("ignoring route for unknown spawner {}", spawner.get());
            return;
        };
        let origin = state.position;
        state.assign_route(route.clone());

        match route {
            Some(route) => {
                self.enemies.adopt_route(spawner, origin, &route);
                out_events.push(Event::RouteAssigned {
                    spawner,
                    steps: route.len(),
                });
            }
            None => out_events.push(Event::PathBlocked { spawner }),
        }
    }

    fn begin_wave(&mut self, spawner: EntityId, out_events: &mut Vec<Event>) {
        match self.spawners.get_mut(spawner) {
            Some(state) if !state.wave_in_progress => {
                state.wave_in_progress = true;
                out_events.push(Event::WaveStarted {
                    spawner,
                    wave: state.wave,
                });
            }
            Some(_) => debug!("spawner {} already runs a wave", spawner.get()),
            None => debug!("ignoring wave start for unknown spawner {}", spawner.get()),
        }
    }

    fn complete_wave(&mut self, spawner: EntityId, out_events: &mut Vec<Event>) {
        match self.spawners.get_mut(spawner) {
            Some(state) if state.wave_in_progress => {
                let finished = state.wave;
                state.wave_in_progress = false;
                state.wave = finished.saturating_add(1);
                out_events.push(Event::WaveCompleted {
                    spawner,
                    wave: finished,
                });
            }
            _ => debug!("spawner {} has no wave to complete", spawner.get()),
        }
    }

    fn spawn_enemy(
        &mut self,
        spawner: EntityId,
        profile: EnemyProfile,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.spawners.get(spawner) else {
            debug!("ignoring spawn for unknown spawner {}", spawner.get());
            return;
        };
        let cell = state.position;
        let enemy = self
            .enemies
            .spawn(spawner, profile, cell, state.route.clone());
        out_events.push(Event::EnemySpawned {
            enemy,
            spawner,
            cell,
        });
    }

    fn damage_enemy(&mut self, enemy: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        let Some((applied, remaining)) = self.enemies.damage(enemy, amount) else {
            return;
        };
        out_events.push(Event::EnemyDamaged {
            enemy,
            amount: applied,
            remaining,
        });
        if remaining <= 0.0 {
            if let Some(defeated) = self.enemies.remove(enemy) {
                out_events.push(Event::EnemyDefeated {
                    enemy,
                    spawner: defeated.spawner,
                });
            }
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.enemies.regenerate(dt);
        for arrival in self.enemies.advance(dt, &self.grid) {
            match arrival {
                Arrival::Waypoint { enemy, cell } => {
                    if self.enemies.get(enemy).is_none() {
                        continue;
                    }
                    if let Some(mine) = self
                        .grid
                        .occupant(cell)
                        .filter(|occupant| occupant.kind.has(Capability::Detonate))
                    {
                        self.detonate(mine.entity, cell, out_events);
                    }
                }
                Arrival::Goal { enemy } => self.enemy_reached_core(enemy, out_events),
            }
        }
    }

    fn detonate(&mut self, mine: EntityId, cell: GridPosition, out_events: &mut Vec<Event>) {
        let center = Vec2::new(cell.x() as f32, cell.y() as f32);
        let radius = self.config.mine_radius;
        let victims: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.position.distance(center) <= radius)
            .map(|enemy| enemy.id)
            .collect();

        out_events.push(Event::MineDetonated {
            mine,
            cell,
            affected: u32::try_from(victims.len()).unwrap_or(u32::MAX),
        });
        if let Err(reason) = self.remove_building(mine, out_events) {
            debug!("mine {} could not be cleared: {reason}", mine.get());
        }
        for victim in victims {
            self.damage_enemy(victim, self.config.mine_damage, out_events);
        }
    }

    fn enemy_reached_core(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let Some(arrived) = self.enemies.remove(enemy) else {
            return;
        };
        let damage = arrived.profile.damage_to_base;
        let before = self.core_integrity;
        self.core_integrity = before.saturating_sub(damage);
        out_events.push(Event::EnemyReachedCore {
            enemy,
            damage,
            integrity: self.core_integrity,
        });
        if before > 0 && self.core_integrity == 0 {
            if let Some(core) = self.core {
                out_events.push(Event::CoreDestroyed { core });
            }
        }
    }

    fn step_spawner(
        &mut self,
        spawner: EntityId,
        to: GridPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SpawnerError> {
        let from = self
            .spawners
            .get(spawner)
            .map(|state| state.position)
            .ok_or(SpawnerError::MissingSpawner)?;
        if !from.is_adjacent(to) {
            return Err(SpawnerError::NotAdjacent);
        }

        match self.grid.occupant(to) {
            Some(occupant)
                if occupant.kind.has(Capability::Goal) || occupant.kind.has(Capability::Spawn) =>
            {
                return Err(SpawnerError::Blocked);
            }
            Some(occupant) => self
                .remove_building(occupant.entity, out_events)
                .map_err(|_| SpawnerError::Blocked)?,
            None => {}
        }
        self.cover([to], out_events);

        let occupant = Occupant {
            entity: spawner,
            kind: BuildingKind::EnemySpawner,
        };
        let _ = self.grid.remove(from);
        if self.grid.place(to, occupant, Footprint::SINGLE).is_err() {
            let _ = self.grid.place(from, occupant, Footprint::SINGLE);
            return Err(SpawnerError::Blocked);
        }
        if let Some(state) = self.buildings.get_mut(spawner) {
            state.origin = to;
        }
        if let Some(state) = self.spawners.get_mut(spawner) {
            state.position = to;
        }

        out_events.push(Event::SpawnerMoved { spawner, from, to });
        Ok(())
    }

    fn merge_spawners(
        &mut self,
        mover: EntityId,
        partner: EntityId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SpawnerError> {
        let moving = self
            .spawners
            .get(mover)
            .cloned()
            .ok_or(SpawnerError::MissingSpawner)?;
        let staying = self
            .spawners
            .get(partner)
            .cloned()
            .ok_or(SpawnerError::MissingSpawner)?;
        if !moving.position.is_adjacent(staying.position) {
            return Err(SpawnerError::NotAdjacent);
        }
        let facing = self
            .buildings
            .get(partner)
            .map_or(Direction::default(), |state| state.facing);

        for id in [mover, partner] {
            self.remove_building(id, out_events)
                .map_err(|_| SpawnerError::MissingSpawner)?;
        }

        let cell = staying.position;
        let Some(merged) =
            self.place_building(BuildingKind::EnemySpawner, cell, facing, out_events)
        else {
            error!("merged spawner could not be placed at {cell:?}");
            return Err(SpawnerError::Blocked);
        };

        let scale = merged_scale(moving.scale, staying.scale);
        if let Some(state) = self.spawners.get_mut(merged) {
            state.scale = scale;
            state.wave = moving.wave.max(staying.wave);
        }
        self.enemies.reparent(mover, merged);
        self.enemies.reparent(partner, merged);

        out_events.push(Event::SpawnersMerged {
            mover,
            partner,
            merged,
            cell,
            scale,
        });
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            let params = world.config.transport();
            let mut context = TransportContext {
                grid: &world.grid,
                items: &mut world.items,
                ledger: &mut world.ledger,
                positions: &world.config.frame,
            };
            world.belts.advance(dt, params, &mut context, out_events);
            world.advance_enemies(dt, out_events);
        }
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::EnsureCoverage { position } => world.cover([position], out_events),
        Command::SetOre { position, ore } => set_ore(world, position, ore, out_events),
        Command::PlaceBuilding {
            kind,
            origin,
            facing,
        } => {
            let _ = world.place_building(kind, origin, facing, out_events);
        }
        Command::RemoveBuilding { entity } => {
            if let Err(reason) = world.remove_building(entity, out_events) {
                out_events.push(Event::RemovalRejected { entity, reason });
            }
        }
        Command::RemoveBuildingAt { position } => {
            if let Some(occupant) = world.grid.occupant(position) {
                if let Err(reason) = world.remove_building(occupant.entity, out_events) {
                    out_events.push(Event::RemovalRejected {
                        entity: occupant.entity,
                        reason,
                    });
                }
            }
        }
        Command::RotateBuilding { entity, facing } => {
            world.rotate_building(entity, facing, out_events);
        }
        Command::PlaceItemOnBelt { belt, ore } => {
            let _ = world.belts.place_item(
                belt,
                ore,
                &mut world.items,
                &world.config.frame,
                out_events,
            );
        }
        Command::DestroyItem { item } => {
            if !world
                .belts
                .destroy_item(item, &mut world.items, out_events)
            {
                debug!("ignoring destruction of unknown item {}", item.get());
            }
        }
        Command::PauseBelt { belt } => {
            let _ = world.belts.set_paused(belt, true);
        }
        Command::ResumeBelt { belt } => {
            let _ = world.belts.set_paused(belt, false);
        }
        Command::AssignRoute { spawner, route } => world.assign_route(spawner, route, out_events),
        Command::RerouteEnemy { enemy, route } => {
            if world.enemies.reroute(enemy, &route) {
                out_events.push(Event::EnemyRerouted {
                    enemy,
                    steps: route.len(),
                });
            }
        }
        Command::BeginWave { spawner } => world.begin_wave(spawner, out_events),
        Command::CompleteWave { spawner } => world.complete_wave(spawner, out_events),
        Command::SpawnEnemy { spawner, profile } => world.spawn_enemy(spawner, profile, out_events),
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
        Command::StepSpawner { spawner, to } => {
            if let Err(reason) = world.step_spawner(spawner, to, out_events) {
                out_events.push(Event::SpawnerStepRejected { spawner, reason });
            }
        }
        Command::MergeSpawners { mover, partner } => {
            if let Err(reason) = world.merge_spawners(mover, partner, out_events) {
                out_events.push(Event::MergeRejected {
                    mover,
                    partner,
                    reason,
                });
            }
        }
    }
}

fn set_ore(world: &mut World, position: GridPosition, ore: OreKind, out_events: &mut Vec<Event>) {
    let (created, marked) = world.grid.set_ore(position, ore);
    if created {
        let (min_bounds, max_bounds) = world.grid.bounds();
        out_events.push(Event::GridExpanded {
            created: 1,
            min_bounds,
            max_bounds,
        });
    }
    if marked {
        out_events.push(Event::OreMarked { position, ore });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use gridforge_core::{
        BeltView, BuildingKind, BuildingView, Cell, EnemyView, GridPosition, GridView, ItemId,
        OreKind, PlayMode, SpawnerSnapshot,
    };

    use super::{Config, Ledger, World};

    /// Reports the play mode currently active in the world.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Provides the configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &Config {
        &world.config
    }

    /// Exposes a read-only view of the sparse grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Returns the cell at `position`, if it was ever covered.
    #[must_use]
    pub fn cell(world: &World, position: GridPosition) -> Option<&Cell> {
        world.grid.cell(position)
    }

    /// Cell occupied by the core, if one is placed.
    #[must_use]
    pub fn core_position(world: &World) -> Option<GridPosition> {
        world
            .core
            .and_then(|core| world.buildings.get(core))
            .map(|state| state.origin)
    }

    /// Remaining core integrity.
    #[must_use]
    pub fn core_integrity(world: &World) -> u32 {
        world.core_integrity
    }

    /// Captures every placed building.
    #[must_use]
    pub fn building_view(world: &World) -> BuildingView {
        BuildingView::from_snapshots(world.buildings.iter().map(|state| state.snapshot()).collect())
    }

    /// Captures every registered belt.
    #[must_use]
    pub fn belt_view(world: &World) -> BeltView {
        BeltView::from_snapshots(world.belts.snapshots())
    }

    /// Captures every spawner in identifier order.
    #[must_use]
    pub fn spawner_view(world: &World) -> Vec<SpawnerSnapshot> {
        world
            .spawners
            .iter()
            .map(|spawner| SpawnerSnapshot {
                id: spawner.id,
                position: spawner.position,
                wave: spawner.wave,
                scale: spawner.scale,
                route: spawner.route.clone(),
                path_blocked: spawner.path_blocked,
                active_enemies: world.enemies.count_for(spawner.id),
            })
            .collect()
    }

    /// Captures every living enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.snapshots())
    }

    /// Provides the resource totals credited by collectors.
    #[must_use]
    pub fn ledger(world: &World) -> &Ledger {
        &world.ledger
    }

    /// World-space position of a live item.
    #[must_use]
    pub fn item_position(world: &World, item: ItemId) -> Option<Vec3> {
        world.items.get(item).map(|item| item.position)
    }

    /// Ore carried by a live item.
    #[must_use]
    pub fn item_ore(world: &World, item: ItemId) -> Option<OreKind> {
        world.items.get(item).map(|item| item.ore)
    }

    /// Number of live items.
    #[must_use]
    pub fn item_count(world: &World) -> usize {
        world.items.len()
    }

    /// Number of commands of kind `Tick` processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of placed buildings of `kind`.
    #[must_use]
    pub fn building_count(world: &World, kind: BuildingKind) -> usize {
        world
            .buildings
            .iter()
            .filter(|state| state.kind == kind)
            .count()
    }
}
