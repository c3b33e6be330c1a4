//! Grid coordinates, cell state and the pure directional math shared by every
//! crate that reasons about the world layout.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{BuildingKind, EntityId, OreKind};

/// Location of a single grid cell expressed as signed column and row indices.
///
/// The grid is unbounded in every direction, so coordinates left or below
/// the starting chunk are negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    x: i32,
    y: i32,
}

impl GridPosition {
    /// Origin of the grid, where the core sits by default.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column index of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position translated by the provided deltas.
    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Returns the neighbouring position one step in `direction`.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        self.translated(dx, dy)
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the straight-line distance between two positions in cells.
    #[must_use]
    pub fn euclidean_distance(self, other: GridPosition) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether the two positions share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: GridPosition) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Cardinal neighbours in north, east, south, west order.
    #[must_use]
    pub fn neighbors(self) -> [GridPosition; 4] {
        Direction::ALL.map(|direction| self.offset(direction))
    }
}

/// Cardinal facing of a placed entity, also used for single grid steps.
///
/// North points toward increasing `y`, East toward increasing `x`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Facing toward increasing row indices.
    #[default]
    North,
    /// Facing toward increasing column indices.
    East,
    /// Facing toward decreasing row indices.
    South,
    /// Facing toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit grid delta of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Direction obtained by a quarter turn clockwise.
    #[must_use]
    pub const fn rotated_clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Direction obtained by a quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotated_counter_clockwise(self) -> Self {
        self.rotated_clockwise().opposite()
    }

    /// Direction of a single step from `from` to `to`, if they are adjacent.
    #[must_use]
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| from.offset(*direction) == to)
    }
}

/// Forward, right, backward and left neighbours of a cell relative to a facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelativeCells {
    /// Cell directly in front of the facing.
    pub forward: GridPosition,
    /// Cell to the right of the facing.
    pub right: GridPosition,
    /// Cell directly behind the facing.
    pub backward: GridPosition,
    /// Cell to the left of the facing.
    pub left: GridPosition,
}

impl RelativeCells {
    /// Resolves the relative neighbours of `cell` for an entity facing `facing`.
    #[must_use]
    pub fn around(cell: GridPosition, facing: Direction) -> Self {
        Self {
            forward: cell.offset(facing),
            right: cell.offset(facing.rotated_clockwise()),
            backward: cell.offset(facing.opposite()),
            left: cell.offset(facing.rotated_counter_clockwise()),
        }
    }
}

/// Converts a world-space point into the grid cell that contains it.
///
/// The grid lies on the world XZ plane with cell centres at integer offsets
/// from `origin`.
#[must_use]
pub fn world_to_grid(point: Vec3, origin: Vec3) -> GridPosition {
    let local = point - origin;
    GridPosition::new(local.x.round() as i32, local.z.round() as i32)
}

/// Converts a grid cell into the world-space point at its centre.
#[must_use]
pub fn grid_to_world(cell: GridPosition, origin: Vec3) -> Vec3 {
    origin + Vec3::new(cell.x() as f32, 0.0, cell.y() as f32)
}

/// Collaborator that maps grid cells onto world-space anchor points.
///
/// Rendering adapters may supply their own mapping; the simulation only ever
/// asks for the anchor of a cell and interpolates between anchors.
pub trait WorldPositions: std::fmt::Debug {
    /// World-space point at which items resting on `cell` are anchored.
    fn world_position(&self, cell: GridPosition) -> Vec3;
}

/// Grid-aligned frame that lifts item anchors above the cell surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    origin: Vec3,
    item_height: f32,
}

impl GridFrame {
    /// Creates a frame anchored at `origin` with items resting `item_height` above cells.
    #[must_use]
    pub const fn new(origin: Vec3, item_height: f32) -> Self {
        Self {
            origin,
            item_height,
        }
    }
}

impl Default for GridFrame {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.3)
    }
}

impl WorldPositions for GridFrame {
    fn world_position(&self, cell: GridPosition) -> Vec3 {
        grid_to_world(cell, self.origin) + Vec3::new(0.0, self.item_height, 0.0)
    }
}

/// Entity occupying a cell together with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Identifier of the placed entity.
    pub entity: EntityId,
    /// Kind of the placed entity.
    pub kind: BuildingKind,
}

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    position: GridPosition,
    walkable: bool,
    ore: Option<OreKind>,
    occupant: Option<Occupant>,
}

impl Cell {
    /// Creates an empty, walkable cell.
    #[must_use]
    pub const fn new(position: GridPosition) -> Self {
        Self {
            position,
            walkable: true,
            ore: None,
            occupant: None,
        }
    }

    /// Position of the cell.
    #[must_use]
    pub const fn position(&self) -> GridPosition {
        self.position
    }

    /// Reports whether an entity occupies the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Reports whether enemies may cross the cell.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Ore deposit marked on the cell, if any.
    #[must_use]
    pub const fn ore(&self) -> Option<OreKind> {
        self.ore
    }

    /// Entity occupying the cell, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    /// Occupies the cell. Returns `false` without changes when already occupied.
    pub fn occupy(&mut self, occupant: Occupant) -> bool {
        if self.occupant.is_some() {
            return false;
        }
        self.walkable = occupant.kind.is_walkable();
        self.occupant = Some(occupant);
        true
    }

    /// Clears the occupant and restores walkability. Returns the removed occupant.
    pub fn vacate(&mut self) -> Option<Occupant> {
        self.walkable = true;
        self.occupant.take()
    }

    /// Marks the cell as an ore deposit. Returns `false` when it already was one.
    pub fn mark_ore(&mut self, ore: OreKind) -> bool {
        if self.ore.is_some() {
            return false;
        }
        self.ore = Some(ore);
        true
    }
}

/// Read-only view into the sparse cell map.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a HashMap<GridPosition, Cell>,
    min_bounds: GridPosition,
    max_bounds: GridPosition,
}

impl<'a> GridView<'a> {
    /// Captures a new view backed by the provided cell map and bounds.
    #[must_use]
    pub fn new(
        cells: &'a HashMap<GridPosition, Cell>,
        min_bounds: GridPosition,
        max_bounds: GridPosition,
    ) -> Self {
        Self {
            cells,
            min_bounds,
            max_bounds,
        }
    }

    /// Returns the cell at `position`, if it was ever covered.
    #[must_use]
    pub fn cell(&self, position: GridPosition) -> Option<&'a Cell> {
        self.cells.get(&position)
    }

    /// Reports whether the grid contains a cell at `position`.
    #[must_use]
    pub fn contains(&self, position: GridPosition) -> bool {
        self.cells.contains_key(&position)
    }

    /// Returns the entity occupying `position`, if any.
    #[must_use]
    pub fn occupant(&self, position: GridPosition) -> Option<Occupant> {
        self.cell(position).and_then(Cell::occupant)
    }

    /// Reports whether enemies may walk onto `position`.
    ///
    /// Positions outside the covered grid are never walkable.
    #[must_use]
    pub fn is_walkable(&self, position: GridPosition) -> bool {
        self.cell(position).is_some_and(Cell::is_walkable)
    }

    /// Lower-left corner of the covered bounding rectangle.
    #[must_use]
    pub const fn min_bounds(&self) -> GridPosition {
        self.min_bounds
    }

    /// Upper-right corner of the covered bounding rectangle.
    #[must_use]
    pub const fn max_bounds(&self) -> GridPosition {
        self.max_bounds
    }

    /// Number of cells ever covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell has been covered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over every covered cell in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells.values()
    }
}
