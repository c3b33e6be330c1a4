#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridforge simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable views such as [`GridView`] and [`BeltView`], and respond
//! exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod building;
mod grid;
mod views;

pub use building::{BuildingKind, Capability, Footprint};
pub use grid::{
    grid_to_world, world_to_grid, Cell, Direction, GridFrame, GridPosition, GridView, Occupant,
    RelativeCells, WorldPositions,
};
pub use views::{
    BeltSnapshot, BeltState, BeltView, BuildingSnapshot, BuildingView, EnemySnapshot, EnemyView,
    Route, SpawnerSnapshot, TransferTarget,
};

/// Edge length of a procedurally generated chunk measured in cells.
pub const CHUNK_SIZE: i32 = 10;

/// Describes the active gameplay mode for the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Waves are released and enemies advance toward the core.
    Attack,
    /// Planning mode in which no new waves are released.
    #[default]
    Builder,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the world transition to the provided play mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: PlayMode,
    },
    /// Ensures the grid contains a cell at the provided position.
    EnsureCoverage {
        /// Position that must be covered.
        position: GridPosition,
    },
    /// Marks a cell as an ore deposit.
    SetOre {
        /// Cell to mark.
        position: GridPosition,
        /// Kind of ore deposited in the cell.
        ore: OreKind,
    },
    /// Requests placement of a building anchored at the provided origin cell.
    PlaceBuilding {
        /// Kind of building to construct.
        kind: BuildingKind,
        /// Lower-left cell of the building footprint.
        origin: GridPosition,
        /// Facing of the building.
        facing: Direction,
    },
    /// Requests removal of a building by identifier.
    RemoveBuilding {
        /// Identifier of the building targeted for removal.
        entity: EntityId,
    },
    /// Requests removal of whatever building occupies the provided cell.
    RemoveBuildingAt {
        /// Cell whose occupant should be removed.
        position: GridPosition,
    },
    /// Changes the facing of a placed building.
    RotateBuilding {
        /// Identifier of the building to rotate.
        entity: EntityId,
        /// New facing.
        facing: Direction,
    },
    /// Offers a freshly produced item to a belt.
    PlaceItemOnBelt {
        /// Belt that should receive the item.
        belt: EntityId,
        /// Ore carried by the item.
        ore: OreKind,
    },
    /// Destroys an item wherever it currently is.
    DestroyItem {
        /// Identifier of the item to destroy.
        item: ItemId,
    },
    /// Suspends item movement on a belt.
    PauseBelt {
        /// Belt to pause.
        belt: EntityId,
    },
    /// Resumes item movement on a belt.
    ResumeBelt {
        /// Belt to resume.
        belt: EntityId,
    },
    /// Publishes the outcome of a path search for a spawner.
    AssignRoute {
        /// Spawner the route belongs to.
        spawner: EntityId,
        /// New route, or `None` when the core is unreachable.
        route: Option<Route>,
    },
    /// Hands a single enemy a route planned from the cell it stands on.
    RerouteEnemy {
        /// Enemy receiving the route.
        enemy: EnemyId,
        /// Waypoints after the enemy's current cell.
        route: Route,
    },
    /// Announces that a spawner begins releasing its current wave.
    BeginWave {
        /// Spawner starting the wave.
        spawner: EntityId,
    },
    /// Announces that a spawner's current wave has been cleared.
    CompleteWave {
        /// Spawner that finished its wave.
        spawner: EntityId,
    },
    /// Requests that a spawner emit a new enemy.
    SpawnEnemy {
        /// Spawner responsible for the enemy.
        spawner: EntityId,
        /// Statistics of the enemy.
        profile: EnemyProfile,
    },
    /// Applies damage to an enemy.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Raw damage before armor is applied.
        amount: f32,
    },
    /// Moves a spawner one cell, clearing any building in the way.
    StepSpawner {
        /// Spawner being moved.
        spawner: EntityId,
        /// Adjacent destination cell.
        to: GridPosition,
    },
    /// Fuses two adjacent spawners into a larger one at the partner's cell.
    MergeSpawners {
        /// Spawner that travelled toward its partner.
        mover: EntityId,
        /// Spawner that stayed in place.
        partner: EntityId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active.
        mode: PlayMode,
    },
    /// Reports that previously untouched cells were added to the grid.
    GridExpanded {
        /// Number of cells created.
        created: u32,
        /// Lower-left corner of the bounding rectangle after expansion.
        min_bounds: GridPosition,
        /// Upper-right corner of the bounding rectangle after expansion.
        max_bounds: GridPosition,
    },
    /// Confirms that a cell was marked as an ore deposit.
    OreMarked {
        /// Marked cell.
        position: GridPosition,
        /// Kind of ore deposited.
        ore: OreKind,
    },
    /// Confirms that a building was placed.
    BuildingPlaced {
        /// Identifier assigned to the building.
        entity: EntityId,
        /// Kind of building placed.
        kind: BuildingKind,
        /// Anchor cell of the footprint.
        origin: GridPosition,
        /// Facing of the building.
        facing: Direction,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Kind of building requested.
        kind: BuildingKind,
        /// Requested anchor cell.
        origin: GridPosition,
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a building was removed.
    BuildingRemoved {
        /// Identifier of the removed building.
        entity: EntityId,
        /// Kind of the removed building.
        kind: BuildingKind,
        /// Anchor cell the building occupied.
        origin: GridPosition,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Identifier of the building targeted for removal.
        entity: EntityId,
        /// Reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that a building changed facing.
    BuildingRotated {
        /// Identifier of the rotated building.
        entity: EntityId,
        /// New facing.
        facing: Direction,
    },
    /// Confirms that a belt accepted a new item.
    ItemPlaced {
        /// Identifier assigned to the item.
        item: ItemId,
        /// Belt holding the item.
        belt: EntityId,
        /// Ore carried by the item.
        ore: OreKind,
    },
    /// Reports that an item moved from one belt to the next.
    ItemTransferred {
        /// Item that moved.
        item: ItemId,
        /// Belt the item left.
        from: EntityId,
        /// Belt now holding the item.
        to: EntityId,
    },
    /// Reports that a collector consumed an item.
    ItemCollected {
        /// Item that was consumed.
        item: ItemId,
        /// Ore credited to the ledger.
        ore: OreKind,
        /// Belt that delivered the item.
        belt: EntityId,
        /// Collector that consumed the item.
        collector: EntityId,
    },
    /// Reports that an item was destroyed before reaching a collector.
    ItemDiscarded {
        /// Item that was destroyed.
        item: ItemId,
        /// Belt that held the item, if any.
        belt: Option<EntityId>,
    },
    /// Confirms that a spawner received a new route.
    RouteAssigned {
        /// Spawner owning the route.
        spawner: EntityId,
        /// Number of steps in the route.
        steps: usize,
    },
    /// Reports that no route from the spawner to the core exists.
    PathBlocked {
        /// Spawner whose route is blocked.
        spawner: EntityId,
    },
    /// Confirms that an enemy switched to a route of its own.
    EnemyRerouted {
        /// Enemy that switched routes.
        enemy: EnemyId,
        /// Number of steps in the new route.
        steps: usize,
    },
    /// Announces that a spawner started a wave.
    WaveStarted {
        /// Spawner releasing the wave.
        spawner: EntityId,
        /// One-based wave number.
        wave: u32,
    },
    /// Announces that a spawner's wave was cleared.
    WaveCompleted {
        /// Spawner whose wave was cleared.
        spawner: EntityId,
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that an enemy entered the world.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Spawner that emitted the enemy.
        spawner: EntityId,
        /// Cell the enemy starts in.
        cell: GridPosition,
    },
    /// Confirms that an enemy lost health.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage applied after armor.
        amount: f32,
        /// Health left after the hit.
        remaining: f32,
    },
    /// Announces that an enemy was destroyed.
    EnemyDefeated {
        /// Enemy that was destroyed.
        enemy: EnemyId,
        /// Spawner the enemy belonged to.
        spawner: EntityId,
    },
    /// Announces that an enemy reached the core.
    EnemyReachedCore {
        /// Enemy that reached the core.
        enemy: EnemyId,
        /// Damage dealt to the core.
        damage: u32,
        /// Core integrity left after the hit.
        integrity: u32,
    },
    /// Announces that the core integrity dropped to zero.
    CoreDestroyed {
        /// Identifier of the destroyed core.
        core: EntityId,
    },
    /// Announces that a land mine exploded.
    MineDetonated {
        /// Mine that exploded.
        mine: EntityId,
        /// Cell the mine occupied.
        cell: GridPosition,
        /// Number of enemies caught in the blast.
        affected: u32,
    },
    /// Confirms that a spawner moved one cell.
    SpawnerMoved {
        /// Spawner that moved.
        spawner: EntityId,
        /// Cell the spawner left.
        from: GridPosition,
        /// Cell the spawner occupies now.
        to: GridPosition,
    },
    /// Reports that a spawner step was rejected.
    SpawnerStepRejected {
        /// Spawner that attempted to move.
        spawner: EntityId,
        /// Reason the step failed.
        reason: SpawnerError,
    },
    /// Confirms that two spawners fused into one.
    SpawnersMerged {
        /// Spawner that travelled toward its partner.
        mover: EntityId,
        /// Spawner that stayed in place.
        partner: EntityId,
        /// Identifier of the resulting spawner.
        merged: EntityId,
        /// Cell of the resulting spawner.
        cell: GridPosition,
        /// Size factor of the resulting spawner.
        scale: f32,
    },
    /// Reports that a merge request was rejected.
    MergeRejected {
        /// Spawner that travelled toward its partner.
        mover: EntityId,
        /// Spawner that stayed in place.
        partner: EntityId,
        /// Reason the merge failed.
        reason: SpawnerError,
    },
}

/// Kinds of ore deposits and of the items mined from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OreKind {
    /// Blue ore.
    Blue,
    /// Yellow ore.
    Yellow,
    /// Red ore.
    Red,
}

impl OreKind {
    /// Every ore kind in cycle order.
    pub const ALL: [OreKind; 3] = [OreKind::Blue, OreKind::Yellow, OreKind::Red];

    /// Ore assigned to a chunk stamped after `chunk_count` chunks were placed.
    #[must_use]
    pub const fn for_chunk_count(chunk_count: usize) -> Self {
        Self::ALL[chunk_count % Self::ALL.len()]
    }
}

/// Unique identifier assigned to a placed entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item travelling on belts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Statistics describing a type of enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyProfile {
    /// Health the enemy spawns with.
    pub max_health: f32,
    /// Movement speed measured in cells per second.
    pub speed: f32,
    /// Core integrity removed when the enemy reaches the core.
    pub damage_to_base: u32,
    /// Armored enemies take half damage.
    pub armored: bool,
    /// Health restored each second, capped at `max_health`.
    pub regeneration_rate: f32,
}

impl Default for EnemyProfile {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 1.0,
            damage_to_base: 1,
            armored: false,
            regeneration_rate: 0.0,
        }
    }
}

impl EnemyProfile {
    /// Damage actually applied for a raw hit of `amount`.
    #[must_use]
    pub fn mitigate(&self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        if self.armored {
            amount * 0.5
        } else {
            amount
        }
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint overlaps an occupied cell.
    #[error("footprint overlaps an occupied cell")]
    Occupied,
    /// The building must sit on an ore deposit.
    #[error("building requires an ore deposit beneath it")]
    MissingOre,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// The building cannot be removed.
    #[error("building cannot be removed")]
    Indestructible,
    /// No building with the provided identifier exists.
    #[error("no building with that identifier exists")]
    MissingBuilding,
}

/// Reasons a spawner movement or merge request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SpawnerError {
    /// No spawner with the provided identifier exists.
    #[error("no spawner with that identifier exists")]
    MissingSpawner,
    /// The spawners or cells involved are not grid-adjacent.
    #[error("cells are not adjacent")]
    NotAdjacent,
    /// The destination holds a building that cannot be cleared.
    #[error("destination is blocked by a permanent occupant")]
    Blocked,
}
