//! Spawn tile selection.
//!
//! Spawn tiles normally come straight from the classified map. If the
//! artwork has no spawn color for a side (a palette miss, or a map drawn
//! without spawns), random ground tiles stand in so the battle can still
//! start.

use crate::grid::Grid;
use crate::hex::AxialCoord;
use crate::mapgen::RandomSource;
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where each side may place its units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPlan {
    pub player: Vec<AxialCoord>,
    pub enemy: Vec<AxialCoord>,
    /// Player tiles were picked from ground because the map had none.
    pub player_fallback: bool,
    /// Enemy tiles were picked from ground because the map had none.
    pub enemy_fallback: bool,
}

impl SpawnPlan {
    pub fn used_fallback(&self) -> bool {
        self.player_fallback || self.enemy_fallback
    }
}

/// Collect spawn tiles for both sides, falling back to random ground.
///
/// Fallback tiles are distinct and never shared between the two sides.
/// When there isn't enough ground, a side gets as many as are available.
pub fn plan_spawns<R: RandomSource + ?Sized>(
    grid: &Grid,
    fallback_count: usize,
    rng: &mut R,
) -> SpawnPlan {
    let mut plan = SpawnPlan {
        player: grid.coords_of(TerrainType::PlayerSpawn),
        enemy: grid.coords_of(TerrainType::EnemySpawn),
        ..Default::default()
    };
    if !plan.player.is_empty() && !plan.enemy.is_empty() {
        return plan;
    }

    let mut ground = grid.coords_of(TerrainType::Ground);
    if plan.player.is_empty() {
        plan.player = take_random(&mut ground, fallback_count, rng);
        plan.player_fallback = true;
        warn!(
            picked = plan.player.len(),
            "no player spawn tiles on map, using random ground"
        );
    }
    if plan.enemy.is_empty() {
        plan.enemy = take_random(&mut ground, fallback_count, rng);
        plan.enemy_fallback = true;
        warn!(
            picked = plan.enemy.len(),
            "no enemy spawn tiles on map, using random ground"
        );
    }
    plan
}

/// Remove up to `count` random entries from `pool`, returned sorted row-major.
fn take_random<R: RandomSource + ?Sized>(
    pool: &mut Vec<AxialCoord>,
    count: usize,
    rng: &mut R,
) -> Vec<AxialCoord> {
    let mut picked = Vec::with_capacity(count.min(pool.len()));
    while picked.len() < count && !pool.is_empty() {
        let i = rng.next_index(pool.len());
        picked.push(pool.swap_remove(i));
    }
    picked.sort();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexLayout, PixelPoint};
    use crate::mapgen::SeededRng;
    use std::collections::HashSet;

    fn ground(rows: usize, cols: usize) -> Grid {
        let layout = HexLayout::new(16.0, PixelPoint::default()).unwrap();
        Grid::filled(rows, cols, &layout, TerrainType::Ground)
    }

    #[test]
    fn test_map_spawns_used_as_is() {
        let mut grid = ground(4, 4);
        grid.set_terrain(&AxialCoord::new(1, 3), TerrainType::PlayerSpawn);
        grid.set_terrain(&AxialCoord::new(0, 3), TerrainType::PlayerSpawn);
        grid.set_terrain(&AxialCoord::new(2, 0), TerrainType::EnemySpawn);

        let plan = plan_spawns(&grid, 4, &mut SeededRng::from_u64(1));
        assert_eq!(plan.player, vec![AxialCoord::new(0, 3), AxialCoord::new(1, 3)]);
        assert_eq!(plan.enemy, vec![AxialCoord::new(2, 0)]);
        assert!(!plan.used_fallback());
    }

    #[test]
    fn test_fallback_picks_distinct_ground() {
        let grid = ground(5, 5);
        let plan = plan_spawns(&grid, 4, &mut SeededRng::from_u64(8));

        assert!(plan.player_fallback && plan.enemy_fallback);
        assert_eq!(plan.player.len(), 4);
        assert_eq!(plan.enemy.len(), 4);

        let all: HashSet<_> = plan.player.iter().chain(&plan.enemy).collect();
        assert_eq!(all.len(), 8);
        assert!(all
            .iter()
            .all(|c| grid.terrain(c) == Some(TerrainType::Ground)));
    }

    #[test]
    fn test_fallback_only_for_missing_side() {
        let mut grid = ground(3, 3);
        grid.set_terrain(&AxialCoord::new(1, 2), TerrainType::PlayerSpawn);
        let plan = plan_spawns(&grid, 2, &mut SeededRng::from_u64(2));

        assert!(!plan.player_fallback);
        assert!(plan.enemy_fallback);
        assert_eq!(plan.player, vec![AxialCoord::new(1, 2)]);
        assert_eq!(plan.enemy.len(), 2);
        assert!(!plan.enemy.contains(&AxialCoord::new(1, 2)));
    }

    #[test]
    fn test_fallback_runs_out_of_ground() {
        let layout = HexLayout::new(16.0, PixelPoint::default()).unwrap();
        let mut grid = Grid::filled(1, 3, &layout, TerrainType::Wall);
        grid.set_terrain(&AxialCoord::new(1, 0), TerrainType::Ground);

        let plan = plan_spawns(&grid, 4, &mut SeededRng::from_u64(5));
        assert_eq!(plan.player, vec![AxialCoord::new(1, 0)]);
        assert!(plan.enemy.is_empty());
    }
}
