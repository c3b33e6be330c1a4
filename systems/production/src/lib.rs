#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ore drill production onto output belts.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use gridforge_core::{
    BeltView, BuildingView, Capability, Cell, Command, EntityId, Event, GridView,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Configuration parameters required to construct the production system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time a drill needs to extract one ore item, in milliseconds.
    pub production_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            production_interval_ms: 5000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Extracting { elapsed: Duration },
    Ready,
    Delivering { belt: EntityId },
}

/// Pure system that turns drill output into belt placement commands.
///
/// A drill whose output belt is missing or busy keeps its finished item and
/// retries on every following tick; the next extraction starts only after the
/// item was accepted.
#[derive(Debug)]
pub struct Production {
    interval: Duration,
    drills: BTreeMap<EntityId, Stage>,
}

impl Production {
    /// Creates a new production system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: Duration::from_millis(config.production_interval_ms),
            drills: BTreeMap::new(),
        }
    }

    /// Number of drills holding a finished item that has not reached a belt.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.drills
            .values()
            .filter(|stage| !matches!(stage, Stage::Extracting { .. }))
            .count()
    }

    /// Consumes events and immutable views to emit item placement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &GridView<'_>,
        buildings: &BuildingView,
        belts: &BeltView,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        let mut accepted = BTreeSet::new();
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::ItemPlaced { belt, .. } => {
                    let _ = accepted.insert(*belt);
                }
                _ => {}
            }
        }

        self.drills.retain(|drill, _| {
            buildings
                .providing(Capability::Produce)
                .any(|snapshot| snapshot.entity == *drill)
        });

        let mut claimed = BTreeSet::new();
        for drill in buildings.providing(Capability::Produce) {
            let stage = self
                .drills
                .entry(drill.entity)
                .or_insert(Stage::Extracting {
                    elapsed: Duration::ZERO,
                });

            if let Stage::Delivering { belt } = *stage {
                *stage = if accepted.contains(&belt) {
                    Stage::Extracting {
                        elapsed: Duration::ZERO,
                    }
                } else {
                    Stage::Ready
                };
            }

            if let Stage::Extracting { elapsed: progress } = *stage {
                let progress = progress.saturating_add(elapsed);
                *stage = if progress >= self.interval {
                    Stage::Ready
                } else {
                    Stage::Extracting { elapsed: progress }
                };
            }

            if *stage != Stage::Ready {
                continue;
            }

            let Some(ore) = grid.cell(drill.origin).and_then(Cell::ore) else {
                warn!("drill {} stands on a cell without ore", drill.entity.get());
                continue;
            };
            let output = drill.origin.offset(drill.facing);
            match belts.at(output) {
                Some(belt) if belt.accepts_items() && claimed.insert(belt.id) => {
                    out.push(Command::PlaceItemOnBelt { belt: belt.id, ore });
                    *stage = Stage::Delivering { belt: belt.id };
                }
                Some(_) => debug!("output belt of drill {} is busy", drill.entity.get()),
                None => debug!("drill {} has no output belt", drill.entity.get()),
            }
        }
    }
}

impl Default for Production {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
