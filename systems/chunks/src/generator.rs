//! Fixed-size chunk content generation.

use gridforge_core::CHUNK_SIZE;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EDGE: usize = CHUNK_SIZE as usize;

/// Number of random draws attempted before falling back to a row-major scan.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 32;

/// Content of a single chunk cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChunkCell {
    /// Plain ground.
    #[default]
    Empty,
    /// Ore deposit.
    Ore,
    /// Enemy spawner location.
    EnemySpawner,
}

/// Square block of generated cells indexed by local `(x, y)` offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    cells: [[ChunkCell; EDGE]; EDGE],
}

impl Chunk {
    fn empty() -> Self {
        Self {
            cells: [[ChunkCell::Empty; EDGE]; EDGE],
        }
    }

    /// Cell at local offset `(x, y)`, or `None` outside the chunk.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<ChunkCell> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Every non-empty cell with its local offset, in row-major order.
    pub fn markers(&self) -> impl Iterator<Item = (usize, usize, ChunkCell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell != ChunkCell::Empty)
                .map(move |(x, cell)| (x, y, *cell))
        })
    }

    fn is_empty_at(&self, x: usize, y: usize) -> bool {
        self.cells[y][x] == ChunkCell::Empty
    }
}

/// Seeded generator producing chunk contents.
#[derive(Debug)]
pub struct ChunkGenerator {
    rng: ChaCha8Rng,
    max_attempts: u32,
}

impl ChunkGenerator {
    /// Creates a generator seeded with `seed` using the default retry cap.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_attempts(seed, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a generator that samples at most `max_attempts` cells per marker.
    #[must_use]
    pub fn with_attempts(seed: u64, max_attempts: u32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_attempts,
        }
    }

    /// Generates a chunk. Initial chunks stay empty; others receive one ore
    /// deposit and one spawner on distinct interior cells.
    pub fn generate(&mut self, initial: bool) -> Chunk {
        let mut chunk = Chunk::empty();
        if initial {
            return chunk;
        }
        self.place_marker(&mut chunk, ChunkCell::Ore);
        self.place_marker(&mut chunk, ChunkCell::EnemySpawner);
        chunk
    }

    fn place_marker(&mut self, chunk: &mut Chunk, marker: ChunkCell) {
        for _ in 0..self.max_attempts {
            let x = self.rng.gen_range(1..EDGE - 1);
            let y = self.rng.gen_range(1..EDGE - 1);
            if chunk.is_empty_at(x, y) {
                chunk.cells[y][x] = marker;
                return;
            }
        }

        let fallback = (1..EDGE - 1)
            .flat_map(|y| (1..EDGE - 1).map(move |x| (x, y)))
            .find(|(x, y)| chunk.is_empty_at(*x, *y));
        if let Some((x, y)) = fallback {
            chunk.cells[y][x] = marker;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_attempts_fall_back_to_row_major_scan() {
        let mut generator = ChunkGenerator::with_attempts(7, 0);
        let chunk = generator.generate(false);
        let markers: Vec<_> = chunk.markers().collect();
        assert_eq!(
            markers,
            vec![(1, 1, ChunkCell::Ore), (2, 1, ChunkCell::EnemySpawner)]
        );
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let chunk = Chunk::empty();
        assert_eq!(chunk.get(0, 0), Some(ChunkCell::Empty));
        assert_eq!(chunk.get(EDGE, 0), None);
    }
}
