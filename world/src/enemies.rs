//! Enemies walking spawner routes toward the core.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use gridforge_core::{Cell, EnemyId, EnemyProfile, EnemySnapshot, EntityId, GridPosition, Route};

use crate::grid::Grid;

const REGENERATION_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) spawner: EntityId,
    pub(crate) profile: EnemyProfile,
    pub(crate) health: f32,
    route: Option<Route>,
    path_index: usize,
    pub(crate) position: Vec2,
    regeneration_elapsed: Duration,
}

impl Enemy {
    pub(crate) fn cell(&self) -> GridPosition {
        cell_of(self.position)
    }

    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            spawner: self.spawner,
            position: self.position,
            cell: self.cell(),
            health: self.health,
            max_health: self.profile.max_health,
            path_index: self.path_index,
            armored: self.profile.armored,
        }
    }
}

/// Outcome of an enemy finishing a step during movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// The enemy came to rest on an intermediate waypoint.
    Waypoint { enemy: EnemyId, cell: GridPosition },
    /// The enemy reached the last waypoint of its route.
    Goal { enemy: EnemyId },
}

/// Owns every living enemy in identifier order.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            enemies: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn spawn(
        &mut self,
        spawner: EntityId,
        profile: EnemyProfile,
        cell: GridPosition,
        route: Option<Route>,
    ) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let _ = self.enemies.insert(
            id,
            Enemy {
                id,
                spawner,
                profile,
                health: profile.max_health,
                route,
                path_index: 0,
                position: Vec2::new(cell.x() as f32, cell.y() as f32),
                regeneration_elapsed: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.enemies.remove(&id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub(crate) fn count_for(&self, spawner: EntityId) -> u32 {
        let count = self
            .enemies
            .values()
            .filter(|enemy| enemy.spawner == spawner)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Applies mitigated damage and returns the applied amount and remaining health.
    pub(crate) fn damage(&mut self, id: EnemyId, amount: f32) -> Option<(f32, f32)> {
        let enemy = self.enemies.get_mut(&id)?;
        let applied = enemy.profile.mitigate(amount);
        enemy.health -= applied;
        Some((applied, enemy.health))
    }

    /// Hands a fresh route to enemies of `spawner` standing on it.
    ///
    /// Enemies still on the spawner cell restart from the first waypoint;
    /// others continue after the waypoint matching their current cell.
    /// Enemies off the new route keep the route they were walking.
    pub(crate) fn adopt_route(&mut self, spawner: EntityId, origin: GridPosition, route: &Route) {
        for enemy in self.enemies.values_mut() {
            if enemy.spawner != spawner {
                continue;
            }
            let cell = enemy.cell();
            let index = if cell == origin {
                Some(0)
            } else {
                route.position_of(cell).map(|index| index + 1)
            };
            if let Some(index) = index {
                enemy.route = Some(route.clone());
                enemy.path_index = index;
            }
        }
    }

    /// Switches a single enemy onto `route`, which starts next to its cell.
    ///
    /// Returns `false` when the enemy is unknown or already walks the same
    /// waypoints.
    pub(crate) fn reroute(&mut self, id: EnemyId, route: &Route) -> bool {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return false;
        };
        if let Some(current) = &enemy.route {
            let remaining = current
                .waypoints()
                .get(enemy.path_index..)
                .unwrap_or_default();
            let ahead = match remaining.split_first() {
                Some((next, rest)) if *next == enemy.cell() => rest,
                _ => remaining,
            };
            if remaining == route.waypoints() || ahead == route.waypoints() {
                return false;
            }
        }
        enemy.route = Some(route.clone());
        enemy.path_index = 0;
        true
    }

    pub(crate) fn reparent(&mut self, from: EntityId, to: EntityId) {
        for enemy in self.enemies.values_mut() {
            if enemy.spawner == from {
                enemy.spawner = to;
            }
        }
    }

    /// Restores health once per elapsed second, capped at the maximum.
    pub(crate) fn regenerate(&mut self, dt: Duration) {
        for enemy in self.enemies.values_mut() {
            enemy.regeneration_elapsed = enemy.regeneration_elapsed.saturating_add(dt);
            while enemy.regeneration_elapsed >= REGENERATION_PERIOD {
                enemy.regeneration_elapsed -= REGENERATION_PERIOD;
                enemy.health =
                    (enemy.health + enemy.profile.regeneration_rate).min(enemy.profile.max_health);
            }
        }
    }

    /// Walks every enemy along its route and reports the waypoints reached.
    ///
    /// Enemies wait in place when the next waypoint is not walkable, unless it
    /// is the final goal cell.
    pub(crate) fn advance(&mut self, dt: Duration, grid: &Grid) -> Vec<Arrival> {
        let mut arrivals = Vec::new();
        let seconds = dt.as_secs_f32();

        for enemy in self.enemies.values_mut() {
            let Some(route) = enemy.route.clone() else {
                continue;
            };
            let mut budget = enemy.profile.speed.max(0.0) * seconds;

            while budget > 0.0 {
                let Some(next) = route.get(enemy.path_index) else {
                    break;
                };
                let is_goal = enemy.path_index + 1 == route.len();
                if !is_goal && !grid.cell(next).is_some_and(Cell::is_walkable) {
                    break;
                }

                let target = Vec2::new(next.x() as f32, next.y() as f32);
                let distance = enemy.position.distance(target);
                if distance > budget {
                    enemy.position += (target - enemy.position) / distance * budget;
                    break;
                }

                enemy.position = target;
                budget -= distance;
                enemy.path_index += 1;
                if is_goal {
                    arrivals.push(Arrival::Goal { enemy: enemy.id });
                    break;
                }
                arrivals.push(Arrival::Waypoint {
                    enemy: enemy.id,
                    cell: next,
                });
            }
        }

        arrivals
    }

    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.enemies.values().map(Enemy::snapshot).collect()
    }
}

pub(crate) fn cell_of(position: Vec2) -> GridPosition {
    GridPosition::new(position.x.round() as i32, position.y.round() as i32)
}
