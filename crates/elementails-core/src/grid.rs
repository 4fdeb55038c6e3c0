//! Battle map grid: a rectangular index over axial space holding typed cells.

use crate::hex::{AxialCoord, HexLayout, PixelPoint};
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most slots a grid may hold.
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Rejected grid data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid of {rows}x{cols} exceeds the {max}-cell limit")]
    TooLarge { rows: usize, cols: usize, max: usize },
    #[error("grid of {rows}x{cols} needs {expected} slots, found {found}")]
    SlotCount {
        rows: usize,
        cols: usize,
        expected: usize,
        found: usize,
    },
    #[error("slot {index} holds cell ({q}, {r})")]
    MisplacedCell { index: usize, q: i32, r: i32 },
}

/// A single sampled hex of the battle map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HexCell {
    pub q: i32,
    pub r: i32,
    /// Pixel center under the layout the grid was built with.
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub terrain: TerrainType,
}

impl HexCell {
    /// Create a cell positioned by a layout.
    pub fn new(coord: AxialCoord, layout: &HexLayout, terrain: TerrainType) -> Self {
        let center = layout.axial_to_pixel(coord);
        Self {
            q: coord.q,
            r: coord.r,
            x: center.x,
            y: center.y,
            terrain,
        }
    }

    pub fn coord(&self) -> AxialCoord {
        AxialCoord::new(self.q, self.r)
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// Rectangular `rows x cols` index of hex cells.
///
/// The cell for axial `(q, r)` lives at row `r`, column `q`. A `None` slot
/// means no cell exists there (outside the source image or template).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<HexCell>>,
}

/// Grid as read from disk, before its slots are checked.
#[derive(Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<HexCell>>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, GridError> {
        let RawGrid { rows, cols, cells } = raw;
        let expected = Grid::checked_size(rows, cols)?;
        if cells.len() != expected {
            return Err(GridError::SlotCount {
                rows,
                cols,
                expected,
                found: cells.len(),
            });
        }

        let grid = Self { rows, cols, cells };
        for (index, slot) in grid.cells.iter().enumerate() {
            if let Some(cell) = slot {
                if grid.index_of(&cell.coord()) != Some(index) {
                    return Err(GridError::MisplacedCell {
                        index,
                        q: cell.q,
                        r: cell.r,
                    });
                }
            }
        }
        Ok(grid)
    }
}

impl Grid {
    /// Slot count of a `rows x cols` grid, if it fits under [`MAX_GRID_CELLS`].
    pub fn checked_size(rows: usize, cols: usize) -> Result<usize, GridError> {
        rows.checked_mul(cols)
            .filter(|n| *n <= MAX_GRID_CELLS)
            .ok_or(GridError::TooLarge {
                rows,
                cols,
                max: MAX_GRID_CELLS,
            })
    }

    /// Create a grid with every slot empty.
    ///
    /// Callers sizing a grid from outside data check [`Grid::checked_size`] first.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Create a grid with every slot holding the same terrain (useful for testing).
    pub fn filled(rows: usize, cols: usize, layout: &HexLayout, terrain: TerrainType) -> Self {
        let mut grid = Self::new(rows, cols);
        for r in 0..rows as i32 {
            for q in 0..cols as i32 {
                grid.insert(HexCell::new(AxialCoord::new(q, r), layout, terrain));
            }
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Linear index `r * cols + q` of a coordinate inside the rectangle.
    pub fn index_of(&self, coord: &AxialCoord) -> Option<usize> {
        coord.linear_index(self.cols, self.rows)
    }

    /// Coordinate for a linear index.
    pub fn coord_of(&self, index: usize) -> Option<AxialCoord> {
        if index >= self.cells.len() {
            return None;
        }
        Some(AxialCoord::new(
            (index % self.cols) as i32,
            (index / self.cols) as i32,
        ))
    }

    /// Get the cell at a coordinate, if one exists.
    pub fn get(&self, coord: &AxialCoord) -> Option<&HexCell> {
        self.index_of(coord)
            .and_then(|i| self.cells.get(i))
            .and_then(Option::as_ref)
    }

    /// Terrain at a coordinate, if a cell exists there.
    pub fn terrain(&self, coord: &AxialCoord) -> Option<TerrainType> {
        self.get(coord).map(|cell| cell.terrain)
    }

    pub fn contains(&self, coord: &AxialCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Insert or replace a cell. Cells outside the rectangle are dropped.
    pub(crate) fn insert(&mut self, cell: HexCell) -> bool {
        match self.index_of(&cell.coord()).and_then(|i| self.cells.get_mut(i)) {
            Some(slot) => {
                *slot = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Change the terrain of an existing cell. Returns false if there is no cell.
    ///
    /// Crate-private: repaints must go through `BattleMapContext`, which
    /// rebuilds the blocked tile index afterwards.
    pub(crate) fn set_terrain(&mut self, coord: &AxialCoord, terrain: TerrainType) -> bool {
        let slot = self.index_of(coord).and_then(|i| self.cells.get_mut(i));
        match slot.and_then(Option::as_mut) {
            Some(cell) => {
                cell.terrain = terrain;
                true
            }
            None => false,
        }
    }

    /// Recompute every cell center for a new layout, keeping terrain.
    pub(crate) fn relayout(&mut self, layout: &HexLayout) {
        for cell in self.cells.iter_mut().flatten() {
            let center = layout.axial_to_pixel(cell.coord());
            cell.x = center.x;
            cell.y = center.y;
        }
    }

    /// Existing neighbor coordinates of a hex.
    pub fn neighbors(&self, coord: &AxialCoord) -> Vec<AxialCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|c| self.contains(c))
            .collect()
    }

    /// Find the existing cell whose hexagon contains a pixel.
    pub fn cell_at_pixel(&self, layout: &HexLayout, point: PixelPoint) -> Option<&HexCell> {
        self.get(&layout.pixel_to_axial(point))
    }

    /// Iterate over existing cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &HexCell> {
        self.cells.iter().flatten()
    }

    /// Raw slots including empty ones, row-major.
    pub fn slots(&self) -> &[Option<HexCell>] {
        &self.cells
    }

    /// Count existing cells.
    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    /// Count cells of one terrain type.
    pub fn count(&self, terrain: TerrainType) -> usize {
        self.cells().filter(|c| c.terrain == terrain).count()
    }

    /// Coordinates of all cells of one terrain type, row-major.
    pub fn coords_of(&self, terrain: TerrainType) -> Vec<AxialCoord> {
        self.cells()
            .filter(|c| c.terrain == terrain)
            .map(HexCell::coord)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> HexLayout {
        HexLayout::new(20.0, PixelPoint::new(20.0, 20.0)).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(4, 6);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 6);
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.slots().len(), 24);
    }

    #[test]
    fn test_grid_filled() {
        let grid = Grid::filled(5, 7, &layout(), TerrainType::Ground);
        assert_eq!(grid.cell_count(), 35);
        let cell = grid.get(&AxialCoord::new(3, 2)).unwrap();
        assert_eq!(cell.terrain, TerrainType::Ground);
        assert_eq!(cell.center(), layout().axial_to_pixel(AxialCoord::new(3, 2)));
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(5, 7);
        let coord = AxialCoord::new(4, 3);
        let index = grid.index_of(&coord).unwrap();
        assert_eq!(index, 3 * 7 + 4);
        assert_eq!(grid.coord_of(index), Some(coord));
        assert_eq!(grid.coord_of(35), None);
        assert_eq!(grid.index_of(&AxialCoord::new(7, 0)), None);
    }

    #[test]
    fn test_set_terrain() {
        let mut grid = Grid::filled(3, 3, &layout(), TerrainType::Ground);
        assert!(grid.set_terrain(&AxialCoord::new(1, 1), TerrainType::Wall));
        assert_eq!(grid.terrain(&AxialCoord::new(1, 1)), Some(TerrainType::Wall));
        assert!(!grid.set_terrain(&AxialCoord::new(5, 1), TerrainType::Wall));

        let mut sparse = Grid::new(3, 3);
        assert!(!sparse.set_terrain(&AxialCoord::new(0, 0), TerrainType::Wall));
    }

    #[test]
    fn test_deserialize_rejects_bad_slots() {
        let short = serde_json::from_str::<Grid>(r#"{"rows":2,"cols":2,"cells":[]}"#);
        assert!(short.is_err());

        // A cell stored in the wrong slot would be unreachable by coordinate
        let mut grid = Grid::filled(2, 2, &layout(), TerrainType::Ground);
        grid.cells.swap(0, 3);
        let json = serde_json::to_string(&grid).unwrap();
        assert!(serde_json::from_str::<Grid>(&json).is_err());

        let huge = r#"{"rows":18446744073709551615,"cols":2,"cells":[]}"#;
        assert!(serde_json::from_str::<Grid>(huge).is_err());
    }

    #[test]
    fn test_deserialize_roundtrip() {
        let mut grid = Grid::filled(3, 2, &layout(), TerrainType::Ground);
        grid.set_terrain(&AxialCoord::new(1, 2), TerrainType::Wall);
        grid.cells[1] = None;
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);
    }

    #[test]
    fn test_checked_size() {
        assert_eq!(Grid::checked_size(4, 6), Ok(24));
        assert!(Grid::checked_size(usize::MAX, 2).is_err());
        assert!(Grid::checked_size(MAX_GRID_CELLS, 2).is_err());
    }

    #[test]
    fn test_neighbors_skip_missing_cells() {
        let grid = Grid::filled(5, 5, &layout(), TerrainType::Ground);
        assert_eq!(grid.neighbors(&AxialCoord::new(2, 2)).len(), 6);

        // Corner should have fewer neighbors
        let corner = grid.neighbors(&AxialCoord::new(0, 0));
        assert_eq!(corner.len(), 2);
        assert!(corner.contains(&AxialCoord::new(1, 0)));
        assert!(corner.contains(&AxialCoord::new(0, 1)));
    }

    #[test]
    fn test_cell_at_pixel() {
        let l = layout();
        let grid = Grid::filled(4, 4, &l, TerrainType::Ground);
        let center = l.axial_to_pixel(AxialCoord::new(2, 1));
        let hit = grid.cell_at_pixel(&l, PixelPoint::new(center.x + 3.0, center.y + 4.0));
        assert_eq!(hit.map(HexCell::coord), Some(AxialCoord::new(2, 1)));
        assert!(grid.cell_at_pixel(&l, PixelPoint::new(-500.0, -500.0)).is_none());
    }

    #[test]
    fn test_relayout_keeps_terrain() {
        let mut grid = Grid::filled(2, 2, &layout(), TerrainType::Ground);
        grid.set_terrain(&AxialCoord::new(1, 1), TerrainType::Void);
        let bigger = layout().with_radius(40.0).unwrap();
        grid.relayout(&bigger);
        let cell = grid.get(&AxialCoord::new(1, 1)).unwrap();
        assert_eq!(cell.terrain, TerrainType::Void);
        assert_eq!(cell.center(), bigger.axial_to_pixel(AxialCoord::new(1, 1)));
    }

    #[test]
    fn test_counts_and_coords() {
        let mut grid = Grid::filled(3, 3, &layout(), TerrainType::Ground);
        grid.set_terrain(&AxialCoord::new(2, 0), TerrainType::EnemySpawn);
        grid.set_terrain(&AxialCoord::new(0, 2), TerrainType::EnemySpawn);
        assert_eq!(grid.count(TerrainType::EnemySpawn), 2);
        assert_eq!(
            grid.coords_of(TerrainType::EnemySpawn),
            vec![AxialCoord::new(2, 0), AxialCoord::new(0, 2)]
        );
    }
}
