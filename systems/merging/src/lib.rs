#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Coordinator that walks veteran spawners toward each other and fuses them.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use gridforge_core::{
    Capability, Command, EntityId, Event, GridPosition, GridView, Occupant, Route,
    SpawnerSnapshot,
};
use gridforge_system_pathfinding::{find_route_with, STEP_COST};
use log::{debug, error, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration parameters required to construct the merge coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Simulated time between merge rounds, in milliseconds.
    pub merge_interval_ms: u64,
    /// Radius around the core that merge paths never enter.
    pub min_core_distance: f32,
    /// Seed for the random pick of the next spawner to pair.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_interval_ms: 2000,
            min_core_distance: 8.0,
            seed: 0x6d65_7267_6572,
        }
    }
}

impl Config {
    /// Simulated time between merge rounds.
    #[must_use]
    pub const fn merge_interval(&self) -> Duration {
        Duration::from_millis(self.merge_interval_ms)
    }
}

#[derive(Clone, Debug)]
struct MergeTask {
    partner: EntityId,
    path: VecDeque<GridPosition>,
}

/// Pure system that pairs spawners past their first wave and steps them
/// together one cell per round.
#[derive(Debug)]
pub struct SpawnerMerger {
    interval: Duration,
    min_core_distance: f32,
    accumulator: Duration,
    rng: ChaCha8Rng,
    tasks: BTreeMap<EntityId, MergeTask>,
    enabled: bool,
}

impl SpawnerMerger {
    /// Creates a new coordinator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: config.merge_interval(),
            min_core_distance: config.min_core_distance,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tasks: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Number of merges currently in progress.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Partner the given mover is walking toward, if it is part of a merge.
    #[must_use]
    pub fn partner_of(&self, mover: EntityId) -> Option<EntityId> {
        self.tasks.get(&mover).map(|task| task.partner)
    }

    /// Consumes world events and immutable views to emit merge commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &GridView<'_>,
        core: Option<GridPosition>,
        spawners: &[SpawnerSnapshot],
        out: &mut Vec<Command>,
    ) {
        if !self.enabled || self.interval.is_zero() {
            return;
        }

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    self.accumulator = self.accumulator.saturating_add(*dt);
                }
                Event::SpawnerStepRejected { spawner, reason } => {
                    if let Some(task) = self.tasks.get_mut(spawner) {
                        debug!("spawner {} step rejected: {reason}", spawner.get());
                        task.path.clear();
                    }
                }
                Event::MergeRejected { mover, reason, .. } => {
                    if self.tasks.remove(mover).is_some() {
                        debug!("merge of spawner {} rejected: {reason}", mover.get());
                    }
                }
                _ => {}
            }
        }

        if self.accumulator < self.interval {
            return;
        }
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
        }

        let Some(core) = core else {
            error!("no core present, disabling spawner merging");
            self.enabled = false;
            return;
        };

        let planner = MergePlanner {
            grid,
            core,
            min_core_distance: self.min_core_distance,
        };
        self.advance_tasks(&planner, spawners, out);
        self.pair_spawners(&planner, spawners);
    }

    fn advance_tasks(
        &mut self,
        planner: &MergePlanner<'_, '_>,
        spawners: &[SpawnerSnapshot],
        out: &mut Vec<Command>,
    ) {
        let movers: Vec<EntityId> = self.tasks.keys().copied().collect();
        for mover in movers {
            let Some(task) = self.tasks.get_mut(&mover) else {
                continue;
            };
            let from = position_of(spawners, mover);
            let to = position_of(spawners, task.partner);
            let (Some(from), Some(to)) = (from, to) else {
                debug!("merge task of spawner {} lost a participant", mover.get());
                let _ = self.tasks.remove(&mover);
                continue;
            };

            if from.is_adjacent(to) {
                out.push(Command::MergeSpawners {
                    mover,
                    partner: task.partner,
                });
                let _ = self.tasks.remove(&mover);
                continue;
            }

            if task.path.front().map_or(true, |next| !from.is_adjacent(*next)) {
                match planner.route(from, to, task.partner) {
                    Some(route) => task.path = route.waypoints().iter().copied().collect(),
                    None => {
                        warn!("spawner {} can no longer reach its partner", mover.get());
                        let _ = self.tasks.remove(&mover);
                        continue;
                    }
                }
            }

            match task.path.pop_front() {
                Some(next) if next != to => out.push(Command::StepSpawner {
                    spawner: mover,
                    to: next,
                }),
                _ => task.path.clear(),
            }
        }
    }

    fn pair_spawners(&mut self, planner: &MergePlanner<'_, '_>, spawners: &[SpawnerSnapshot]) {
        let mut available: Vec<&SpawnerSnapshot> = spawners
            .iter()
            .filter(|spawner| spawner.wave > 1)
            .filter(|spawner| !self.is_busy(spawner.id))
            .collect();

        while available.len() >= 2 {
            let index = self.rng.gen_range(0..available.len());
            let first = available.remove(index);

            let mut candidates: Vec<(usize, f32)> = available
                .iter()
                .enumerate()
                .map(|(slot, other)| (slot, first.position.euclidean_distance(other.position)))
                .collect();
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            let found = candidates.into_iter().find_map(|(slot, _)| {
                let partner = available[slot];
                planner
                    .route(first.position, partner.position, partner.id)
                    .map(|route| (slot, route))
            });

            match found {
                Some((slot, route)) => {
                    let partner = available.remove(slot);
                    debug!(
                        "spawner {} heads for spawner {} in {} steps",
                        first.id.get(),
                        partner.id.get(),
                        route.len()
                    );
                    let _ = self.tasks.insert(
                        first.id,
                        MergeTask {
                            partner: partner.id,
                            path: route.waypoints().iter().copied().collect(),
                        },
                    );
                }
                None => debug!("spawner {} has no reachable partner", first.id.get()),
            }
        }
    }

    fn is_busy(&self, spawner: EntityId) -> bool {
        self.tasks.contains_key(&spawner) || self.tasks.values().any(|task| task.partner == spawner)
    }
}

impl Default for SpawnerMerger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

struct MergePlanner<'g, 'a> {
    grid: &'g GridView<'a>,
    core: GridPosition,
    min_core_distance: f32,
}

impl MergePlanner<'_, '_> {
    /// Path that keeps clear of the core exclusion zone and of spawners other
    /// than `partner`. Other buildings are ignored since the mover clears them.
    fn route(&self, from: GridPosition, to: GridPosition, partner: EntityId) -> Option<Route> {
        find_route_with(from, to, |cell| {
            if cell == to {
                return Some(STEP_COST);
            }
            let inside = self.grid.cell(cell)?;
            if cell.euclidean_distance(self.core) < self.min_core_distance {
                return None;
            }
            match inside.occupant() {
                Some(Occupant { kind, .. }) if kind.has(Capability::Goal) => None,
                Some(Occupant { entity, kind })
                    if kind.has(Capability::Spawn) && entity != partner =>
                {
                    None
                }
                _ => Some(STEP_COST),
            }
        })
    }
}

fn position_of(spawners: &[SpawnerSnapshot], id: EntityId) -> Option<GridPosition> {
    spawners
        .iter()
        .find(|spawner| spawner.id == id)
        .map(|spawner| spawner.position)
}
