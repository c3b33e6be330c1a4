//! Enemy spawner bookkeeping: wave counters, routes and merge scale.

use std::collections::BTreeMap;

use gridforge_core::{EntityId, GridPosition, Route};

#[derive(Clone, Debug)]
pub(crate) struct Spawner {
    pub(crate) id: EntityId,
    pub(crate) position: GridPosition,
    pub(crate) wave: u32,
    pub(crate) wave_in_progress: bool,
    pub(crate) scale: f32,
    pub(crate) route: Option<Route>,
    pub(crate) path_blocked: bool,
}

impl Spawner {
    pub(crate) fn new(id: EntityId, position: GridPosition) -> Self {
        Self {
            id,
            position,
            wave: 1,
            wave_in_progress: false,
            scale: 1.0,
            route: None,
            path_blocked: false,
        }
    }

    /// Records a path search result. A missing route keeps the last known one.
    pub(crate) fn assign_route(&mut self, route: Option<Route>) {
        match route {
            Some(route) => {
                self.route = Some(route);
                self.path_blocked = false;
            }
            None => self.path_blocked = true,
        }
    }
}

/// Scale of a spawner produced by fusing spawners of scale `a` and `b`.
pub(crate) fn merged_scale(a: f32, b: f32) -> f32 {
    let (larger, smaller) = if a >= b { (a, b) } else { (b, a) };
    larger + smaller / 2.0
}

#[derive(Debug, Default)]
pub(crate) struct SpawnerTable {
    spawners: BTreeMap<EntityId, Spawner>,
}

impl SpawnerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, spawner: Spawner) {
        let _ = self.spawners.insert(spawner.id, spawner);
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Spawner> {
        self.spawners.remove(&id)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Spawner> {
        self.spawners.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Spawner> {
        self.spawners.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Spawner> {
        self.spawners.values()
    }
}
