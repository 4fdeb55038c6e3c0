//! Line of sight between battle map tiles.
//!
//! A line is drawn in cube space between the two hex centers and sampled
//! once per hex step. Every hex strictly between the endpoints must exist
//! and must not be blocked; the endpoints themselves are never checked.

use crate::blocked::BlockedTileIndex;
use crate::grid::Grid;
use crate::hex::AxialCoord;

/// Read-only line of sight queries over a grid and its blocked index.
#[derive(Clone, Copy, Debug)]
pub struct LineOfSight<'a> {
    grid: &'a Grid,
    blocked: &'a BlockedTileIndex,
}

impl<'a> LineOfSight<'a> {
    pub fn new(grid: &'a Grid, blocked: &'a BlockedTileIndex) -> Self {
        Self { grid, blocked }
    }

    /// True iff no hex strictly between `from` and `to` is blocked or missing.
    pub fn has_line_of_sight(&self, from: AxialCoord, to: AxialCoord) -> bool {
        let line = from.line_to(&to);
        if line.len() <= 2 {
            return true;
        }
        line[1..line.len() - 1]
            .iter()
            .all(|hex| self.grid.contains(hex) && !self.blocked.is_blocked(hex))
    }

    /// All existing tiles within `range` steps of `from` that it can see.
    ///
    /// Includes `from` itself when it is on the grid.
    pub fn visible_from(&self, from: AxialCoord, range: u32) -> Vec<AxialCoord> {
        self.grid
            .cells()
            .map(|cell| cell.coord())
            .filter(|coord| from.distance(coord) <= range)
            .filter(|coord| self.has_line_of_sight(from, *coord))
            .collect()
    }
}
