//! Static description of every placeable entity and its capabilities.

use serde::{Deserialize, Serialize};

/// Types of entities that can occupy grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// The player's base that enemies attempt to reach.
    Core,
    /// Conveyor segment that carries one item toward the cell it faces.
    Belt,
    /// Extractor placed on an ore deposit that feeds the belt it faces.
    OreDrill,
    /// Terminal sink that converts delivered items into resources.
    Collector,
    /// Single-target defensive tower.
    Turret,
    /// Area defensive tower that arcs every enemy in range.
    ElectricTower,
    /// Walkable explosive that detonates when an enemy steps on it.
    LandMine,
    /// Source of enemy waves.
    EnemySpawner,
}

/// Behaviour an entity kind contributes to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Enemies path toward this entity.
    Goal,
    /// Moves items between cells.
    Transport,
    /// Produces items onto an adjacent belt.
    Produce,
    /// Accepts items delivered by belts.
    Collect,
    /// Damages enemies within range.
    Defend,
    /// Explodes when an enemy enters its cell.
    Detonate,
    /// Emits waves of enemies.
    Spawn,
}

const CORE_CAPABILITIES: &[Capability] = &[Capability::Goal];
const BELT_CAPABILITIES: &[Capability] = &[Capability::Transport];
const DRILL_CAPABILITIES: &[Capability] = &[Capability::Produce];
const COLLECTOR_CAPABILITIES: &[Capability] = &[Capability::Collect];
const TOWER_CAPABILITIES: &[Capability] = &[Capability::Defend];
const MINE_CAPABILITIES: &[Capability] = &[Capability::Detonate];
const SPAWNER_CAPABILITIES: &[Capability] = &[Capability::Spawn];

impl BuildingKind {
    /// Capability table entry for the kind.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Core => CORE_CAPABILITIES,
            Self::Belt => BELT_CAPABILITIES,
            Self::OreDrill => DRILL_CAPABILITIES,
            Self::Collector => COLLECTOR_CAPABILITIES,
            Self::Turret | Self::ElectricTower => TOWER_CAPABILITIES,
            Self::LandMine => MINE_CAPABILITIES,
            Self::EnemySpawner => SPAWNER_CAPABILITIES,
        }
    }

    /// Reports whether the kind provides `capability`.
    #[must_use]
    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Width and height of the cells covered by the kind, anchored at its origin.
    #[must_use]
    pub const fn footprint(self) -> Footprint {
        match self {
            Self::Collector => Footprint::new(2, 2),
            _ => Footprint::new(1, 1),
        }
    }

    /// Reports whether enemies may cross cells occupied by the kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::LandMine)
    }

    /// Reports whether the kind may be removed once placed.
    #[must_use]
    pub const fn is_destructible(self) -> bool {
        !matches!(self, Self::Core)
    }
}

/// Rectangular set of cells an entity occupies, extending toward +x and +y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    width: u8,
    height: u8,
}

impl Footprint {
    /// Footprint covering a single cell.
    pub const SINGLE: Self = Self::new(1, 1);

    /// Creates a footprint with explicit dimensions. Zero dimensions are widened to one.
    #[must_use]
    pub const fn new(width: u8, height: u8) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u8 {
        self.height
    }

    /// Cells covered when the footprint is anchored at `origin`.
    pub fn cells(self, origin: crate::GridPosition) -> impl Iterator<Item = crate::GridPosition> {
        (0..i32::from(self.height)).flat_map(move |dy| {
            (0..i32::from(self.width)).map(move |dx| origin.translated(dx, dy))
        })
    }
}
