//! Set of impassable, opaque tiles derived from a grid.

use crate::grid::Grid;
use crate::hex::AxialCoord;
use std::collections::HashSet;
use tracing::debug;

/// Linear indices `r * cols + q` of every wall or void cell.
///
/// Derived data: always rebuilt from scratch from a [`Grid`], never edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockedTileIndex {
    rows: usize,
    cols: usize,
    blocked: HashSet<usize>,
}

impl BlockedTileIndex {
    /// Build the index with one pass over the grid.
    pub fn from_grid(grid: &Grid) -> Self {
        let blocked: HashSet<usize> = grid
            .cells()
            .filter(|cell| cell.terrain.is_blocked())
            .filter_map(|cell| grid.index_of(&cell.coord()))
            .collect();
        debug!(blocked = blocked.len(), "rebuilt blocked tile index");

        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            blocked,
        }
    }

    /// Is the tile at this linear index blocked?
    pub fn contains(&self, index: usize) -> bool {
        self.blocked.contains(&index)
    }

    /// Is the tile at this coordinate blocked? Coordinates off the grid are not.
    pub fn is_blocked(&self, coord: &AxialCoord) -> bool {
        coord
            .linear_index(self.cols, self.rows)
            .is_some_and(|i| self.contains(i))
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexLayout, PixelPoint};
    use crate::terrain::TerrainType;

    fn grid() -> Grid {
        let layout = HexLayout::new(10.0, PixelPoint::default()).unwrap();
        let mut grid = Grid::filled(4, 5, &layout, TerrainType::Ground);
        grid.set_terrain(&AxialCoord::new(1, 1), TerrainType::Wall);
        grid.set_terrain(&AxialCoord::new(3, 2), TerrainType::Void);
        grid.set_terrain(&AxialCoord::new(0, 3), TerrainType::PlayerSpawn);
        grid
    }

    #[test]
    fn test_walls_and_voids_blocked() {
        let index = BlockedTileIndex::from_grid(&grid());
        assert_eq!(index.len(), 2);
        assert!(index.contains(5 + 1));
        assert!(index.contains(2 * 5 + 3));
        assert!(index.is_blocked(&AxialCoord::new(1, 1)));
        assert!(index.is_blocked(&AxialCoord::new(3, 2)));
        assert!(!index.is_blocked(&AxialCoord::new(0, 3)));
    }

    #[test]
    fn test_off_grid_not_blocked() {
        let index = BlockedTileIndex::from_grid(&grid());
        assert!(!index.is_blocked(&AxialCoord::new(-1, 1)));
        assert!(!index.is_blocked(&AxialCoord::new(6, 1)));
    }

    #[test]
    fn test_empty_grid() {
        let index = BlockedTileIndex::from_grid(&Grid::new(3, 3));
        assert!(index.is_empty());
    }
}
