//! Sparse cell store backing the authoritative world.

use std::collections::HashMap;

use gridforge_core::{
    Cell, EntityId, Footprint, GridPosition, GridView, Occupant, OreKind, PlacementError,
};

/// Sparse, unbounded grid of cells with monotonically growing bounds.
#[derive(Debug, Default)]
pub(crate) struct Grid {
    cells: HashMap<GridPosition, Cell>,
    bounds: Option<(GridPosition, GridPosition)>,
    anchors: HashMap<EntityId, (GridPosition, Footprint)>,
}

impl Grid {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a default cell at `position` when absent and widens the bounds.
    ///
    /// Returns whether a new cell was created.
    pub(crate) fn ensure_coverage(&mut self, position: GridPosition) -> bool {
        self.bounds = Some(match self.bounds {
            None => (position, position),
            Some((min, max)) => (
                GridPosition::new(min.x().min(position.x()), min.y().min(position.y())),
                GridPosition::new(max.x().max(position.x()), max.y().max(position.y())),
            ),
        });

        if self.cells.contains_key(&position) {
            return false;
        }
        let _ = self.cells.insert(position, Cell::new(position));
        true
    }

    pub(crate) fn cell(&self, position: GridPosition) -> Option<&Cell> {
        self.cells.get(&position)
    }

    pub(crate) fn occupant(&self, position: GridPosition) -> Option<Occupant> {
        self.cell(position).and_then(Cell::occupant)
    }

    /// Occupies every footprint cell anchored at `origin`, covering them first.
    pub(crate) fn place(
        &mut self,
        origin: GridPosition,
        occupant: Occupant,
        footprint: Footprint,
    ) -> Result<(), PlacementError> {
        for position in footprint.cells(origin) {
            let _ = self.ensure_coverage(position);
        }

        if footprint
            .cells(origin)
            .any(|position| self.cell(position).is_some_and(Cell::is_occupied))
        {
            return Err(PlacementError::Occupied);
        }

        for position in footprint.cells(origin) {
            if let Some(cell) = self.cells.get_mut(&position) {
                let _ = cell.occupy(occupant);
            }
        }
        let _ = self.anchors.insert(occupant.entity, (origin, footprint));
        Ok(())
    }

    /// Clears every cell held by the occupant found at `position`.
    ///
    /// Unknown or unoccupied positions are a no-op.
    pub(crate) fn remove(&mut self, position: GridPosition) -> Option<Occupant> {
        let occupant = self.occupant(position)?;
        match self.anchors.remove(&occupant.entity) {
            Some((origin, footprint)) => {
                for cell in footprint.cells(origin) {
                    self.vacate_if_held(cell, occupant);
                }
            }
            None => self.vacate_if_held(position, occupant),
        }
        Some(occupant)
    }

    fn vacate_if_held(&mut self, position: GridPosition, occupant: Occupant) {
        if let Some(cell) = self.cells.get_mut(&position) {
            if cell.occupant() == Some(occupant) {
                let _ = cell.vacate();
            }
        }
    }

    /// Marks `position` as an ore deposit.
    ///
    /// Returns whether a cell was created and whether the ore mark was new.
    pub(crate) fn set_ore(&mut self, position: GridPosition, ore: OreKind) -> (bool, bool) {
        let created = self.ensure_coverage(position);
        let marked = self
            .cells
            .get_mut(&position)
            .is_some_and(|cell| cell.mark_ore(ore));
        (created, marked)
    }

    pub(crate) fn bounds(&self) -> (GridPosition, GridPosition) {
        self.bounds
            .unwrap_or((GridPosition::ORIGIN, GridPosition::ORIGIN))
    }

    pub(crate) fn view(&self) -> GridView<'_> {
        let (min, max) = self.bounds();
        GridView::new(&self.cells, min, max)
    }
}
