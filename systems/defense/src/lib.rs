#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower state and enemy snapshots into damage commands.

mod targeting;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use gridforge_core::{
    BuildingKind, BuildingSnapshot, BuildingView, Capability, Command, EnemyId, EnemyView,
    EntityId, Event,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Parameters of single-target turrets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    /// Reach of the turret, in cells.
    pub range: f32,
    /// Damage dealt per shot.
    pub damage: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Interval between target reevaluations, in milliseconds.
    pub retarget_ms: u64,
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            range: 4.0,
            damage: 20.0,
            fire_rate: 1.5,
            retarget_ms: 500,
        }
    }
}

impl TurretConfig {
    fn reload(&self) -> Duration {
        if self.fire_rate > 0.0 {
            Duration::try_from_secs_f32(1.0 / self.fire_rate).unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        }
    }
}

/// Parameters of area-of-effect electric towers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricConfig {
    /// Reach of the discharge, in cells.
    pub range: f32,
    /// Damage dealt to every enemy in range per discharge.
    pub damage_per_tick: f32,
    /// Interval between discharges, in milliseconds.
    pub tick_ms: u64,
}

impl Default for ElectricConfig {
    fn default() -> Self {
        Self {
            range: 10.0,
            damage_per_tick: 10.0,
            tick_ms: 500,
        }
    }
}

/// Configuration parameters required to construct the defense system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Turret parameters.
    pub turret: TurretConfig,
    /// Electric tower parameters.
    pub electric: ElectricConfig,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TowerState {
    Turret {
        target: Option<EnemyId>,
        retarget_in: Duration,
        reload: Duration,
    },
    Electric {
        charge: Duration,
    },
}

impl TowerState {
    fn for_kind(kind: BuildingKind) -> Option<Self> {
        if !kind.has(Capability::Defend) {
            return None;
        }
        Some(match kind {
            BuildingKind::ElectricTower => Self::Electric {
                charge: Duration::ZERO,
            },
            _ => Self::Turret {
                target: None,
                retarget_in: Duration::ZERO,
                reload: Duration::ZERO,
            },
        })
    }
}

/// Tower combat system keeping per-tower cooldowns between invocations.
#[derive(Debug)]
pub struct Defense {
    config: Config,
    towers: BTreeMap<EntityId, TowerState>,
}

impl Defense {
    /// Creates a new defense system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            towers: BTreeMap::new(),
        }
    }

    /// Enemy the turret is currently locked on, if any.
    #[must_use]
    pub fn target_of(&self, turret: EntityId) -> Option<EnemyId> {
        match self.towers.get(&turret) {
            Some(TowerState::Turret { target, .. }) => *target,
            _ => None,
        }
    }

    /// Emits `Command::DamageEnemy` entries for towers ready to strike.
    pub fn handle(
        &mut self,
        events: &[Event],
        buildings: &BuildingView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        self.towers.retain(|tower, _| {
            buildings
                .iter()
                .any(|snapshot| snapshot.entity == *tower)
        });

        for building in buildings.iter() {
            let Some(initial) = TowerState::for_kind(building.kind) else {
                continue;
            };
            self.towers
                .entry(building.entity)
                .or_insert(initial)
                .advance(building, &self.config, elapsed, enemies, out);
        }
    }
}

impl Default for Defense {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl TowerState {
    fn advance(
        &mut self,
        building: &BuildingSnapshot,
        config: &Config,
        elapsed: Duration,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        let center = center_of(building);
        match self {
            Self::Turret {
                target,
                retarget_in,
                reload,
            } => {
                let turret = config.turret;
                if let Some(locked) = *target {
                    if !targeting::holds(center, turret.range, enemies, locked) {
                        debug!(
                            "turret {} releases enemy {}",
                            building.entity.get(),
                            locked.get()
                        );
                        *target = None;
                        *retarget_in = Duration::ZERO;
                    }
                }
                if retarget_in.is_zero() {
                    *target = targeting::furthest_along(center, turret.range, enemies);
                    *retarget_in = Duration::from_millis(turret.retarget_ms);
                }

                if let Some(locked) = *target {
                    if reload.is_zero() {
                        debug!(
                            "turret {} fires at enemy {}",
                            building.entity.get(),
                            locked.get()
                        );
                        out.push(Command::DamageEnemy {
                            enemy: locked,
                            amount: turret.damage,
                        });
                        *reload = turret.reload();
                    }
                    *reload = reload.saturating_sub(elapsed);
                }
                *retarget_in = retarget_in.saturating_sub(elapsed);
            }
            Self::Electric { charge } => {
                let interval = Duration::from_millis(config.electric.tick_ms);
                *charge = charge.saturating_add(elapsed);
                if *charge < interval {
                    return;
                }
                *charge = charge.saturating_sub(interval);

                for enemy in targeting::all_within(center, config.electric.range, enemies) {
                    out.push(Command::DamageEnemy {
                        enemy,
                        amount: config.electric.damage_per_tick,
                    });
                }
            }
        }
    }
}

fn center_of(building: &BuildingSnapshot) -> Vec2 {
    let footprint = building.kind.footprint();
    Vec2::new(
        building.origin.x() as f32 + (f32::from(footprint.width()) - 1.0) * 0.5,
        building.origin.y() as f32 + (f32::from(footprint.height()) - 1.0) * 0.5,
    )
}
