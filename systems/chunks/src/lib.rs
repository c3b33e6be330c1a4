#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural chunk generation and the expansion system that stamps chunks
//! into the world.

mod generator;

use std::collections::BTreeSet;

use gridforge_core::{
    BuildingKind, Command, Direction, Event, GridPosition, OreKind, CHUNK_SIZE,
};
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub use generator::{Chunk, ChunkCell, ChunkGenerator, DEFAULT_MAX_ATTEMPTS};

/// Configuration parameters required to construct the expansion system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for chunk selection and chunk content.
    pub seed: u64,
    /// Minimum straight-line distance between the core and a stamped spawner.
    pub min_core_distance: f32,
    /// Random draws per marker before the deterministic fallback.
    pub max_attempts: u32,
    /// Expands the map once every time a wave is cleared.
    pub expand_on_wave_complete: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0x5eed_c4a2_71f0_0b1d,
            min_core_distance: 8.0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            expand_on_wave_complete: true,
        }
    }
}

/// Coordinate of a chunk on the chunk lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    x: i32,
    y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the chunk.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the chunk.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Global grid position of the chunk cell at local offset `(x, y)`.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> GridPosition {
        let local_x = i32::try_from(x).unwrap_or(0);
        let local_y = i32::try_from(y).unwrap_or(0);
        GridPosition::new(
            self.x * CHUNK_SIZE + local_x,
            self.y * CHUNK_SIZE + local_y,
        )
    }

    fn neighbors(self) -> [ChunkCoord; 4] {
        Direction::ALL.map(|direction| {
            let (dx, dy) = direction.offset();
            ChunkCoord::new(self.x + dx, self.y + dy)
        })
    }
}

/// System that grows the map one chunk at a time.
#[derive(Debug)]
pub struct ChunkExpansion {
    generator: ChunkGenerator,
    rng: ChaCha8Rng,
    placed: BTreeSet<ChunkCoord>,
    min_core_distance: f32,
    expand_on_wave_complete: bool,
}

impl ChunkExpansion {
    /// Creates a new expansion system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            generator: ChunkGenerator::with_attempts(config.seed, config.max_attempts),
            rng: ChaCha8Rng::seed_from_u64(config.seed.rotate_left(17) ^ 0x9e37_79b9_7f4a_7c15),
            placed: BTreeSet::new(),
            min_core_distance: config.min_core_distance,
            expand_on_wave_complete: config.expand_on_wave_complete,
        }
    }

    /// Stamps the empty starting chunk at the lattice origin followed by one
    /// random expansion.
    pub fn bootstrap(&mut self, core: GridPosition, out: &mut Vec<Command>) {
        if !self.placed.is_empty() {
            debug!("chunk expansion already bootstrapped");
            return;
        }
        let chunk = self.generator.generate(true);
        self.stamp(ChunkCoord::new(0, 0), &chunk, core, out);
        let _ = self.expand(core, out);
    }

    /// Stamps a random unplaced chunk adjacent to the placed ones.
    ///
    /// Returns the chosen coordinate, or `None` when nothing was placed yet.
    pub fn expand(&mut self, core: GridPosition, out: &mut Vec<Command>) -> Option<ChunkCoord> {
        let candidates: BTreeSet<ChunkCoord> = self
            .placed
            .iter()
            .flat_map(|coord| coord.neighbors())
            .filter(|coord| !self.placed.contains(coord))
            .collect();
        if candidates.is_empty() {
            warn!("no chunk positions available for expansion");
            return None;
        }

        let index = self.rng.gen_range(0..candidates.len());
        let coord = candidates.into_iter().nth(index)?;
        let chunk = self.generator.generate(false);
        self.stamp(coord, &chunk, core, out);
        Some(coord)
    }

    /// Expands once per cleared wave reported in `events`.
    pub fn handle(&mut self, events: &[Event], core: Option<GridPosition>, out: &mut Vec<Command>) {
        if !self.expand_on_wave_complete {
            return;
        }
        let completed = events
            .iter()
            .filter(|event| matches!(event, Event::WaveCompleted { .. }))
            .count();
        if completed == 0 {
            return;
        }
        let Some(core) = core else {
            warn!("no core present, skipping chunk expansion");
            return;
        };
        for _ in 0..completed {
            let _ = self.expand(core, out);
        }
    }

    /// Chunk coordinates stamped so far, in coordinate order.
    pub fn placed(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.placed.iter().copied()
    }

    fn stamp(&mut self, coord: ChunkCoord, chunk: &Chunk, core: GridPosition, out: &mut Vec<Command>) {
        let ore = OreKind::for_chunk_count(self.placed.len());
        let edge = usize::try_from(CHUNK_SIZE).unwrap_or(0);
        for y in 0..edge {
            for x in 0..edge {
                out.push(Command::EnsureCoverage {
                    position: coord.cell(x, y),
                });
            }
        }

        for (x, y, marker) in chunk.markers() {
            let position = coord.cell(x, y);
            match marker {
                ChunkCell::Ore => out.push(Command::SetOre { position, ore }),
                ChunkCell::EnemySpawner => {
                    if position.euclidean_distance(core) >= self.min_core_distance {
                        out.push(Command::PlaceBuilding {
                            kind: BuildingKind::EnemySpawner,
                            origin: position,
                            facing: Direction::default(),
                        });
                    } else {
                        debug!("spawner at {position:?} is too close to the core");
                    }
                }
                ChunkCell::Empty => {}
            }
        }

        let _ = self.placed.insert(coord);
        debug!("stamped chunk ({}, {})", coord.x, coord.y);
    }
}
