//! Procedural battle map generation.
//!
//! Used when a battle's map image is missing or cannot be decoded: the
//! battle still starts, on a plain field with a spawn band for each side
//! and a sprinkling of walls in between. Generation is driven by a
//! [`RandomSource`] so the same seed always yields the same field.

use crate::grid::{Grid, HexCell};
use crate::hex::{AxialCoord, HexLayout};
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A source of uniform random numbers.
///
/// Only `next_u64` is required; everything else is derived from it.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    /// Generate a random u32.
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a random index in range [0, max).
    fn next_index(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }

    /// Generate a random float in range [0.0, 1.0).
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a boolean with given probability of true.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

/// A deterministic random number generator using xorshift.
///
/// The same seed always produces the same sequence on every platform.
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from arbitrary seed bytes.
    pub fn from_seed(seed: &[u8]) -> Self {
        // FNV-1a over the seed bytes
        let mut state: u64 = 0xcbf29ce484222325;
        for &byte in seed {
            state ^= byte as u64;
            state = state.wrapping_mul(0x100000001b3);
        }
        // xorshift never leaves zero
        if state == 0 {
            state = 0x853c49e6748fea9b;
        }
        Self { state }
    }

    pub fn from_u64(seed: u64) -> Self {
        Self::from_seed(&seed.to_le_bytes())
    }
}

impl RandomSource for SeededRng {
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

/// Shape of the procedurally generated fallback field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackGridConfig {
    pub rows: usize,
    pub cols: usize,
    /// Rows reserved for each side's spawns: enemies at the top, players at the bottom.
    pub spawn_band_depth: usize,
    /// Probability that a cell between the bands becomes a wall.
    pub wall_chance: f64,
}

impl Default for FallbackGridConfig {
    fn default() -> Self {
        Self {
            rows: 13,
            cols: 17,
            spawn_band_depth: 2,
            wall_chance: 0.08,
        }
    }
}

/// Generate a fully populated fallback grid.
///
/// When the field is too short to fit both bands, they shrink so the enemy
/// band never overlaps the player band.
pub fn generate_fallback_grid<R: RandomSource + ?Sized>(
    layout: &HexLayout,
    config: &FallbackGridConfig,
    rng: &mut R,
) -> Grid {
    let rows = config.rows;
    let cols = config.cols;
    let band = config.spawn_band_depth.min(rows / 2);
    let mut grid = Grid::new(rows, cols);

    for r in 0..rows {
        for q in 0..cols {
            let terrain = if r < band {
                TerrainType::EnemySpawn
            } else if r >= rows - band {
                TerrainType::PlayerSpawn
            } else if rng.chance(config.wall_chance) {
                TerrainType::Wall
            } else {
                TerrainType::Ground
            };
            let coord = AxialCoord::new(q as i32, r as i32);
            grid.insert(HexCell::new(coord, layout, terrain));
        }
    }

    debug!(
        rows,
        cols,
        walls = grid.count(TerrainType::Wall),
        "generated fallback battle map"
    );
    grid
}
