//! Authoritative building state management utilities.

use std::collections::BTreeMap;

use gridforge_core::{BuildingKind, BuildingSnapshot, Direction, EntityId, GridPosition};

/// Snapshot of a building stored inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildingState {
    /// Identifier allocated by the world for the building.
    pub(crate) entity: EntityId,
    /// Kind of building that was constructed.
    pub(crate) kind: BuildingKind,
    /// Anchor cell of the footprint.
    pub(crate) origin: GridPosition,
    /// Facing chosen at placement or by a later rotation.
    pub(crate) facing: Direction,
}

impl BuildingState {
    pub(crate) fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            entity: self.entity,
            kind: self.kind,
            origin: self.origin,
            facing: self.facing,
        }
    }

    /// Reports whether any footprint cell is edge-adjacent to `position`.
    pub(crate) fn borders(&self, position: GridPosition) -> bool {
        self.kind
            .footprint()
            .cells(self.origin)
            .any(|cell| cell.is_adjacent(position))
    }
}

/// Registry that stores buildings and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct BuildingRegistry {
    entries: BTreeMap<EntityId, BuildingState>,
    next_entity_id: EntityId,
}

impl BuildingRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_entity_id: EntityId::new(0),
        }
    }

    /// Reserves the next identifier without registering anything.
    pub(crate) fn allocate(&mut self) -> EntityId {
        let entity = self.next_entity_id;
        self.next_entity_id = EntityId::new(entity.get().saturating_add(1));
        entity
    }

    pub(crate) fn insert(&mut self, state: BuildingState) {
        let _ = self.entries.insert(state.entity, state);
    }

    pub(crate) fn remove(&mut self, entity: EntityId) -> Option<BuildingState> {
        self.entries.remove(&entity)
    }

    pub(crate) fn get(&self, entity: EntityId) -> Option<&BuildingState> {
        self.entries.get(&entity)
    }

    pub(crate) fn get_mut(&mut self, entity: EntityId) -> Option<&mut BuildingState> {
        self.entries.get_mut(&entity)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BuildingState> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let mut registry = BuildingRegistry::new();
        assert!(registry.iter().next().is_none());
        assert_eq!(registry.allocate(), EntityId::new(0));
        assert_eq!(registry.allocate(), EntityId::new(1));
    }

    #[test]
    fn collector_borders_every_ring_cell() {
        let state = BuildingState {
            entity: EntityId::new(7),
            kind: BuildingKind::Collector,
            origin: GridPosition::new(1, 1),
            facing: Direction::North,
        };

        assert!(state.borders(GridPosition::new(0, 2)));
        assert!(state.borders(GridPosition::new(3, 1)));
        assert!(state.borders(GridPosition::new(2, 3)));
        assert!(!state.borders(GridPosition::new(0, 0)));
        assert_eq!(state.snapshot().origin, GridPosition::new(1, 1));
    }
}
