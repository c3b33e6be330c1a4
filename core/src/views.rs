//! Immutable snapshots that systems query instead of touching world state.

use std::sync::Arc;

use glam::Vec2;

use crate::{BuildingKind, Capability, Direction, EnemyId, EntityId, GridPosition, ItemId};

/// Shared, read-only list of waypoints leading from a spawner to the core.
///
/// The spawner's own cell is not part of the route; the final waypoint is the
/// goal cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    waypoints: Arc<[GridPosition]>,
}

impl Route {
    /// Creates a route from the provided waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<GridPosition>) -> Self {
        Self {
            waypoints: waypoints.into(),
        }
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[GridPosition] {
        &self.waypoints
    }

    /// Number of single-cell steps along the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the route contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<GridPosition> {
        self.waypoints.get(index).copied()
    }

    /// Final waypoint of the route.
    #[must_use]
    pub fn destination(&self) -> Option<GridPosition> {
        self.waypoints.last().copied()
    }

    /// Index of `cell` within the route, if the route passes through it.
    #[must_use]
    pub fn position_of(&self, cell: GridPosition) -> Option<usize> {
        self.waypoints.iter().position(|waypoint| *waypoint == cell)
    }

    /// Reports whether two handles share the same waypoint allocation.
    #[must_use]
    pub fn shares_allocation(&self, other: &Route) -> bool {
        Arc::ptr_eq(&self.waypoints, &other.waypoints)
    }
}

/// Entity a belt is currently handing its item to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferTarget {
    /// Another belt whose slot was reserved for the item.
    Belt(EntityId),
    /// A collector that accepts the item on arrival.
    Collector(EntityId),
}

impl TransferTarget {
    /// Identifier of the receiving entity.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::Belt(entity) | Self::Collector(entity) => *entity,
        }
    }
}

/// Phase of a belt's transport state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BeltState {
    /// No item on the belt.
    #[default]
    Idle,
    /// An item rests on the belt waiting to move on.
    Carrying,
    /// The item is travelling toward a reserved destination.
    Transferring {
        /// Destination receiving the item.
        target: TransferTarget,
    },
    /// The destination was unavailable on the last tick; retried next tick.
    Blocked,
}

/// Immutable representation of a belt used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeltSnapshot {
    /// Identifier of the belt entity.
    pub id: EntityId,
    /// Cell occupied by the belt.
    pub position: GridPosition,
    /// Direction items travel.
    pub facing: Direction,
    /// Cached downstream cell, if one has been resolved.
    pub downstream: Option<GridPosition>,
    /// Item resting on or leaving the belt.
    pub carried: Option<ItemId>,
    /// Indicates the slot holds an item or one is about to vacate it.
    pub space_taken: bool,
    /// Upstream belt holding a reservation on this belt's slot.
    pub reserved_by: Option<EntityId>,
    /// Indicates item movement is suspended.
    pub paused: bool,
    /// Current transport phase.
    pub state: BeltState,
}

impl BeltSnapshot {
    /// Reports whether an upstream belt has claimed the slot.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }

    /// Reports whether a producer may place a new item on the belt.
    #[must_use]
    pub const fn accepts_items(&self) -> bool {
        self.carried.is_none() && !self.space_taken && self.reserved_by.is_none()
    }
}

/// Read-only snapshot describing every belt.
#[derive(Clone, Debug, Default)]
pub struct BeltView {
    snapshots: Vec<BeltSnapshot>,
}

impl BeltView {
    /// Creates a new belt view sorted by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BeltSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the belts in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BeltSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the belt with `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&BeltSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Snapshot of the belt occupying `position`.
    #[must_use]
    pub fn at(&self, position: GridPosition) -> Option<&BeltSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.position == position)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BeltSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a placed building.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildingSnapshot {
    /// Identifier allocated by the world.
    pub entity: EntityId,
    /// Kind of building.
    pub kind: BuildingKind,
    /// Anchor cell of the footprint.
    pub origin: GridPosition,
    /// Facing chosen at placement or by a later rotation.
    pub facing: Direction,
}

/// Read-only snapshot describing every placed building.
#[derive(Clone, Debug, Default)]
pub struct BuildingView {
    snapshots: Vec<BuildingSnapshot>,
}

impl BuildingView {
    /// Creates a new building view sorted by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BuildingSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.entity);
        Self { snapshots }
    }

    /// Iterator over every building in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the buildings whose kind provides `capability`.
    pub fn providing(&self, capability: Capability) -> impl Iterator<Item = &BuildingSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.kind.has(capability))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BuildingSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of an enemy spawner.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnerSnapshot {
    /// Identifier of the spawner entity.
    pub id: EntityId,
    /// Cell occupied by the spawner.
    pub position: GridPosition,
    /// Wave counter, starting at one.
    pub wave: u32,
    /// Visual size factor accumulated through merges.
    pub scale: f32,
    /// Last route assigned by the pathfinder.
    pub route: Option<Route>,
    /// Indicates the latest replanning found no route.
    pub path_blocked: bool,
    /// Number of living enemies emitted by the spawner.
    pub active_enemies: u32,
}

/// Immutable representation of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned at spawn.
    pub id: EnemyId,
    /// Spawner the enemy belongs to.
    pub spawner: EntityId,
    /// Continuous position measured in cells.
    pub position: Vec2,
    /// Cell nearest to the enemy.
    pub cell: GridPosition,
    /// Remaining health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Index of the next waypoint along the enemy's route.
    pub path_index: usize,
    /// Indicates incoming damage is halved.
    pub armored: bool,
}

/// Read-only snapshot describing every living enemy.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view sorted by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the enemies in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of living enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
