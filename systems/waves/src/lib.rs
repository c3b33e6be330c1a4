#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling for enemy spawners.
//!
//! Each spawner walks through the configured waves independently: it spawns
//! the wave one enemy at a time, waits until every enemy it emitted is gone,
//! completes the wave and rests before starting the next one.

use std::{collections::BTreeMap, time::Duration};

use gridforge_core::{Command, EnemyProfile, EntityId, Event, PlayMode, SpawnerSnapshot};
use log::debug;
use serde::{Deserialize, Serialize};

/// Batch of identical enemies within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyGroup {
    /// Statistics shared by every enemy of the group.
    pub profile: EnemyProfile,
    /// Number of enemies spawned from the group.
    pub count: u32,
}

impl Default for EnemyGroup {
    fn default() -> Self {
        Self {
            profile: EnemyProfile::default(),
            count: 1,
        }
    }
}

/// Composition and pacing of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSpec {
    /// Groups spawned in order.
    pub groups: Vec<EnemyGroup>,
    /// Seconds between consecutive spawns.
    pub time_between_spawns: f32,
    /// Seconds of rest between completing this wave and starting the next.
    pub time_before_next_wave: f32,
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            time_between_spawns: 1.0,
            time_before_next_wave: 5.0,
        }
    }
}

impl WaveSpec {
    /// Delay between consecutive spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.time_between_spawns)
    }

    /// Rest after the wave is cleared.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        seconds(self.time_before_next_wave)
    }

    /// Total number of enemies in the wave.
    #[must_use]
    pub fn enemy_count(&self) -> u32 {
        self.groups
            .iter()
            .fold(0, |total, group| total.saturating_add(group.count))
    }

    fn enemy_at(&self, mut index: u32) -> Option<EnemyProfile> {
        for group in &self.groups {
            if index < group.count {
                return Some(group.profile);
            }
            index -= group.count;
        }
        None
    }
}

/// Configuration parameters required to construct the wave system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Waves every spawner runs through, first wave first.
    pub waves: Vec<WaveSpec>,
}

impl Default for Config {
    fn default() -> Self {
        let grunt = EnemyProfile::default();
        let brute = EnemyProfile {
            max_health: 150.0,
            speed: 0.8,
            damage_to_base: 2,
            armored: true,
            ..EnemyProfile::default()
        };
        let runner = EnemyProfile {
            max_health: 80.0,
            speed: 1.5,
            regeneration_rate: 5.0,
            ..EnemyProfile::default()
        };

        Self {
            waves: vec![
                WaveSpec {
                    groups: vec![EnemyGroup {
                        profile: grunt,
                        count: 5,
                    }],
                    ..WaveSpec::default()
                },
                WaveSpec {
                    groups: vec![
                        EnemyGroup {
                            profile: grunt,
                            count: 8,
                        },
                        EnemyGroup {
                            profile: brute,
                            count: 2,
                        },
                    ],
                    ..WaveSpec::default()
                },
                WaveSpec {
                    groups: vec![
                        EnemyGroup {
                            profile: grunt,
                            count: 10,
                        },
                        EnemyGroup {
                            profile: brute,
                            count: 4,
                        },
                        EnemyGroup {
                            profile: runner,
                            count: 4,
                        },
                    ],
                    time_between_spawns: 0.75,
                    ..WaveSpec::default()
                },
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    Spawning {
        wave: usize,
        cursor: u32,
        wait: Duration,
    },
    AwaitingClear {
        wave: usize,
    },
    Cooldown {
        wait: Duration,
    },
    Finished,
}

/// Pure system that paces waves per spawner while the game is in attack mode.
#[derive(Debug)]
pub struct Waves {
    waves: Vec<WaveSpec>,
    phases: BTreeMap<EntityId, Phase>,
}

impl Waves {
    /// Creates a new wave system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            waves: config.waves,
            phases: BTreeMap::new(),
        }
    }

    /// Reports whether `spawner` has run through every configured wave.
    #[must_use]
    pub fn is_finished(&self, spawner: EntityId) -> bool {
        matches!(self.phases.get(&spawner), Some(Phase::Finished))
    }

    /// Consumes events and spawner snapshots to emit wave commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_mode: PlayMode,
        spawners: &[SpawnerSnapshot],
        out: &mut Vec<Command>,
    ) {
        self.phases
            .retain(|id, _| spawners.iter().any(|spawner| spawner.id == *id));

        if play_mode != PlayMode::Attack {
            return;
        }

        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        for spawner in spawners {
            let phase = self.phases.entry(spawner.id).or_insert(Phase::Pending);
            advance(&self.waves, spawner, phase, elapsed, out);
        }
    }
}

impl Default for Waves {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn advance(
    waves: &[WaveSpec],
    spawner: &SpawnerSnapshot,
    phase: &mut Phase,
    mut budget: Duration,
    out: &mut Vec<Command>,
) {
    let id = spawner.id;
    loop {
        match *phase {
            Phase::Pending => {
                let index = usize::try_from(spawner.wave.saturating_sub(1)).unwrap_or(usize::MAX);
                if index >= waves.len() {
                    debug!("spawner {} completed every wave", id.get());
                    *phase = Phase::Finished;
                    return;
                }
                out.push(Command::BeginWave { spawner: id });
                *phase = Phase::Spawning {
                    wave: index,
                    cursor: 0,
                    wait: Duration::ZERO,
                };
            }
            Phase::Spawning { wave, cursor, wait } => {
                if wait > budget {
                    *phase = Phase::Spawning {
                        wave,
                        cursor,
                        wait: wait - budget,
                    };
                    return;
                }
                budget -= wait;

                let Some(spec) = waves.get(wave) else {
                    *phase = Phase::Finished;
                    return;
                };
                match spec.enemy_at(cursor) {
                    Some(profile) => {
                        out.push(Command::SpawnEnemy {
                            spawner: id,
                            profile,
                        });
                        *phase = Phase::Spawning {
                            wave,
                            cursor: cursor + 1,
                            wait: spec.spawn_interval(),
                        };
                    }
                    None => {
                        *phase = Phase::AwaitingClear { wave };
                        return;
                    }
                }
            }
            Phase::AwaitingClear { wave } => {
                if spawner.active_enemies > 0 {
                    return;
                }
                out.push(Command::CompleteWave { spawner: id });
                let wait = waves.get(wave).map_or(Duration::ZERO, WaveSpec::cooldown);
                *phase = Phase::Cooldown { wait };
                return;
            }
            Phase::Cooldown { wait } => {
                if wait > budget {
                    *phase = Phase::Cooldown {
                        wait: wait - budget,
                    };
                    return;
                }
                budget -= wait;
                *phase = Phase::Pending;
            }
            Phase::Finished => return,
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
