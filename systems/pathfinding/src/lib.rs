#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid routing for enemy spawners.
//!
//! [`find_route`] plans a single route; the [`Pathfinder`] system replans every
//! spawner and every walking enemy whenever the world reports a topology
//! change.

mod astar;

use gridforge_core::{Command, EnemyView, Event, GridPosition, GridView, SpawnerSnapshot};
use log::{debug, error, warn};

pub use astar::{find_route, find_route_with, STEP_COST};

/// Pure system that keeps spawner routes in sync with the grid topology.
#[derive(Debug)]
pub struct Pathfinder {
    enabled: bool,
    pending: bool,
}

impl Pathfinder {
    /// Creates a pathfinder that plans on its first invocation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            pending: true,
        }
    }

    /// Reports whether the system is still running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consumes world events and emits route assignments.
    ///
    /// Every spawner is replanned after a topology change. Spawners that never
    /// received a route are planned as soon as they appear.
    ///
    /// Enemies already on the field are replanned from their own cell in the
    /// same pass, so walkers cut off from their spawner's new route still
    /// reach the core.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &GridView<'_>,
        core: Option<GridPosition>,
        spawners: &[SpawnerSnapshot],
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if !self.enabled {
            return;
        }

        if events.iter().any(changes_topology) {
            self.pending = true;
        }
        let unrouted = spawners
            .iter()
            .any(|spawner| spawner.route.is_none() && !spawner.path_blocked);
        if !self.pending && !unrouted {
            return;
        }

        let Some(core) = core else {
            error!("no core present, disabling pathfinding");
            self.enabled = false;
            return;
        };

        let replan_all = self.pending;
        self.pending = false;
        for spawner in spawners {
            if !replan_all && (spawner.route.is_some() || spawner.path_blocked) {
                continue;
            }

            let route = find_route(grid, spawner.position, core);
            match &route {
                Some(route)
                    if !spawner.path_blocked && spawner.route.as_ref() == Some(route) =>
                {
                    continue;
                }
                Some(route) => debug!(
                    "spawner {} routed in {} steps",
                    spawner.id.get(),
                    route.len()
                ),
                None if spawner.path_blocked => continue,
                None => warn!("spawner {} has no path to the core", spawner.id.get()),
            }
            out.push(Command::AssignRoute {
                spawner: spawner.id,
                route,
            });
        }

        if replan_all {
            reroute_enemies(grid, core, enemies, out);
        }
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

fn reroute_enemies(
    grid: &GridView<'_>,
    core: GridPosition,
    enemies: &EnemyView,
    out: &mut Vec<Command>,
) {
    for enemy in enemies.iter().filter(|enemy| enemy.cell != core) {
        match find_route(grid, enemy.cell, core) {
            Some(route) if !route.is_empty() => out.push(Command::RerouteEnemy {
                enemy: enemy.id,
                route,
            }),
            _ => debug!("enemy {} has no path to the core", enemy.id.get()),
        }
    }
}

fn changes_topology(event: &Event) -> bool {
    matches!(
        event,
        Event::BuildingPlaced { .. }
            | Event::BuildingRemoved { .. }
            | Event::GridExpanded { .. }
            | Event::SpawnerMoved { .. }
            | Event::SpawnersMerged { .. }
    )
}
