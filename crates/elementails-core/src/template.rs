//! Authored battle map templates and terrain assignment files.
//!
//! The canonical template is the trimmed hexagon: every hex within five
//! steps of the center, minus three cells along each outer side, leaving 73
//! cells. Cells are numbered row-major by `r`, then `q`, and terrain is
//! exchanged as lists of those numbers:
//!
//! ```json
//! { "template": "hex73", "layout": "flat_top_axial",
//!   "indices": { "wall": [..], "void": [..], "playerSpawn": [..], "enemySpawn": [..] } }
//! ```
//!
//! Ground is implicit: any index missing from every list is ground.

use crate::context::{BattleMapContext, MapSource};
use crate::grid::{Grid, HexCell};
use crate::hex::{AxialCoord, HexLayout, AXIAL_DIRECTIONS};
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Name of the 73-cell trimmed hexagon.
pub const HEX73: &str = "hex73";

/// The only layout assignment files may declare.
pub const FLAT_TOP_AXIAL: &str = "flat_top_axial";

const HEX73_RADIUS: i32 = 5;

/// Steps from a corner, along its side, of the cells trimmed from that side.
const HEX73_TRIMMED_STEPS: [i32; 3] = [2, 3, 4];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("assignment is for template {found:?}, expected {expected:?}")]
    UnknownTemplate { expected: String, found: String },
    #[error("unsupported layout {0:?}, only \"flat_top_axial\" is supported")]
    UnknownLayout(String),
    #[error("cell index {index} out of range for a {len}-cell template")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cell index {0} is assigned more than one terrain")]
    ConflictingIndex(usize),
    #[error("template cell {0} is missing from the grid")]
    MissingCell(usize),
    #[error("malformed assignment: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Non-ground terrain by template cell index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentIndices {
    #[serde(default)]
    pub wall: Vec<usize>,
    #[serde(default)]
    pub void: Vec<usize>,
    #[serde(default)]
    pub player_spawn: Vec<usize>,
    #[serde(default)]
    pub enemy_spawn: Vec<usize>,
}

impl AssignmentIndices {
    fn lists(&self) -> [(TerrainType, &[usize]); 4] {
        [
            (TerrainType::Wall, self.wall.as_slice()),
            (TerrainType::Void, self.void.as_slice()),
            (TerrainType::PlayerSpawn, self.player_spawn.as_slice()),
            (TerrainType::EnemySpawn, self.enemy_spawn.as_slice()),
        ]
    }

    fn list_mut(&mut self, terrain: TerrainType) -> Option<&mut Vec<usize>> {
        match terrain {
            TerrainType::Wall => Some(&mut self.wall),
            TerrainType::Void => Some(&mut self.void),
            TerrainType::PlayerSpawn => Some(&mut self.player_spawn),
            TerrainType::EnemySpawn => Some(&mut self.enemy_spawn),
            TerrainType::Ground => None,
        }
    }
}

/// Terrain assignment for a template, as exchanged with editor tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub template: String,
    pub layout: String,
    pub indices: AssignmentIndices,
}

impl Assignment {
    pub fn to_json(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an assignment. Checked against a template by [`HexTemplate::resolve`].
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A fixed set of cells around a center, numbered row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexTemplate {
    name: String,
    radius: i32,
    /// Centered coordinates, sorted by `(r, q)`.
    cells: Vec<AxialCoord>,
}

impl HexTemplate {
    /// The 73-cell trimmed hexagon.
    pub fn hex73() -> Self {
        let radius = HEX73_RADIUS;
        let trimmed: HashSet<AxialCoord> = (0..6)
            .flat_map(|side| {
                let (cq, cr) = AXIAL_DIRECTIONS[side];
                let (sq, sr) = AXIAL_DIRECTIONS[(side + 2) % 6];
                HEX73_TRIMMED_STEPS
                    .map(|k| AxialCoord::new(cq * radius + sq * k, cr * radius + sr * k))
            })
            .collect();

        let center = AxialCoord::default();
        let mut cells = Vec::new();
        for r in -radius..=radius {
            for q in -radius..=radius {
                let coord = AxialCoord::new(q, r);
                if coord.distance(&center) <= radius as u32 && !trimmed.contains(&coord) {
                    cells.push(coord);
                }
            }
        }

        Self {
            name: HEX73.to_string(),
            radius,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Centered coordinates in index order.
    pub fn cells(&self) -> &[AxialCoord] {
        &self.cells
    }

    /// Side of the square grid that holds the template.
    pub fn grid_side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    /// Grid coordinate of a template cell: the center sits at `(radius, radius)`.
    pub fn grid_coord(&self, index: usize) -> Option<AxialCoord> {
        self.cells
            .get(index)
            .map(|c| AxialCoord::new(c.q + self.radius, c.r + self.radius))
    }

    /// Template index of a grid coordinate.
    pub fn index_of(&self, grid_coord: &AxialCoord) -> Option<usize> {
        let centered = AxialCoord::new(grid_coord.q - self.radius, grid_coord.r - self.radius);
        self.cells.binary_search_by_key(&(centered.r, centered.q), |c| (c.r, c.q)).ok()
    }

    /// An all-ground grid of the template's cells; everything else stays empty.
    pub fn build_grid(&self, layout: &HexLayout) -> Grid {
        let side = self.grid_side();
        let mut grid = Grid::new(side, side);
        for index in 0..self.len() {
            if let Some(coord) = self.grid_coord(index) {
                grid.insert(HexCell::new(coord, layout, TerrainType::Ground));
            }
        }
        grid
    }

    /// Check an assignment and expand it to one terrain per cell, in index order.
    pub fn resolve(&self, assignment: &Assignment) -> Result<Vec<TerrainType>, TemplateError> {
        if assignment.template != self.name {
            return Err(TemplateError::UnknownTemplate {
                expected: self.name.clone(),
                found: assignment.template.clone(),
            });
        }
        if assignment.layout != FLAT_TOP_AXIAL {
            return Err(TemplateError::UnknownLayout(assignment.layout.clone()));
        }

        let mut terrain = vec![TerrainType::Ground; self.len()];
        let mut assigned: HashMap<usize, TerrainType> = HashMap::new();
        for (kind, indices) in assignment.indices.lists() {
            for &index in indices {
                if index >= self.len() {
                    return Err(TemplateError::IndexOutOfRange {
                        index,
                        len: self.len(),
                    });
                }
                match assigned.insert(index, kind) {
                    Some(previous) if previous != kind => {
                        return Err(TemplateError::ConflictingIndex(index))
                    }
                    _ => terrain[index] = kind,
                }
            }
        }
        Ok(terrain)
    }

    /// Build a grid with an assignment applied.
    pub fn grid_from_assignment(
        &self,
        assignment: &Assignment,
        layout: &HexLayout,
    ) -> Result<Grid, TemplateError> {
        let terrain = self.resolve(assignment)?;
        let mut grid = self.build_grid(layout);
        for (index, kind) in terrain.into_iter().enumerate() {
            if let Some(coord) = self.grid_coord(index) {
                grid.set_terrain(&coord, kind);
            }
        }
        Ok(grid)
    }

    /// Load an assignment into a fresh battle map.
    pub fn load_map(
        &self,
        assignment: &Assignment,
        layout: HexLayout,
    ) -> Result<BattleMapContext, TemplateError> {
        let grid = self.grid_from_assignment(assignment, &layout)?;
        Ok(BattleMapContext::from_grid(layout, grid, MapSource::Authored))
    }

    /// Repaint an existing map's template cells from an assignment.
    ///
    /// Nothing is painted unless the whole assignment is valid.
    pub fn apply(
        &self,
        assignment: &Assignment,
        map: &mut BattleMapContext,
    ) -> Result<usize, TemplateError> {
        let terrain = self.resolve(assignment)?;
        let edits: Vec<(AxialCoord, TerrainType)> = terrain
            .into_iter()
            .enumerate()
            .filter_map(|(index, kind)| Some((self.grid_coord(index)?, kind)))
            .collect();
        Ok(map.paint_batch(edits))
    }

    /// Read a grid's terrain back out as an assignment.
    pub fn export(&self, grid: &Grid) -> Result<Assignment, TemplateError> {
        let mut indices = AssignmentIndices::default();
        for index in 0..self.len() {
            let kind = self
                .grid_coord(index)
                .and_then(|coord| grid.terrain(&coord))
                .ok_or(TemplateError::MissingCell(index))?;
            if let Some(list) = indices.list_mut(kind) {
                list.push(index);
            }
        }
        Ok(Assignment {
            template: self.name.clone(),
            layout: FLAT_TOP_AXIAL.to_string(),
            indices,
        })
    }
}
