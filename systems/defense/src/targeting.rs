//! Deterministic target selection for single-target towers.

use glam::Vec2;
use gridforge_core::{EnemyId, EnemySnapshot, EnemyView};

/// Picks the in-range enemy furthest along its route.
///
/// Ties prefer the closer enemy, then the lower identifier.
pub(crate) fn furthest_along(center: Vec2, range: f32, enemies: &EnemyView) -> Option<EnemyId> {
    let mut best: Option<Candidate> = None;
    for enemy in enemies.iter() {
        let Some(current) = Candidate::within(center, range, enemy) else {
            continue;
        };
        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }
    best.map(|candidate| candidate.enemy)
}

/// Reports whether `enemy` is still alive and within `range` of `center`.
pub(crate) fn holds(center: Vec2, range: f32, enemies: &EnemyView, enemy: EnemyId) -> bool {
    enemies
        .iter()
        .filter(|snapshot| snapshot.id == enemy)
        .any(|snapshot| Candidate::within(center, range, snapshot).is_some())
}

/// Every enemy whose position lies within `range` of `center`, in identifier order.
pub(crate) fn all_within(center: Vec2, range: f32, enemies: &EnemyView) -> Vec<EnemyId> {
    enemies
        .iter()
        .filter(|enemy| enemy.position.distance_squared(center) <= range * range)
        .map(|enemy| enemy.id)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    enemy: EnemyId,
    path_index: usize,
    distance_sq: f32,
}

impl Candidate {
    fn within(center: Vec2, range: f32, enemy: &EnemySnapshot) -> Option<Self> {
        let distance_sq = enemy.position.distance_squared(center);
        (distance_sq <= range * range).then_some(Self {
            enemy: enemy.id,
            path_index: enemy.path_index,
            distance_sq,
        })
    }

    fn precedes(&self, other: &Self) -> bool {
        if self.path_index != other.path_index {
            return self.path_index > other.path_index;
        }

        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }

        self.enemy < other.enemy
    }
}
