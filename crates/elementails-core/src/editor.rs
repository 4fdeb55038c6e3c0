//! Battle map editing: brush painting, hex resizing, the editor's JSON
//! format, and rendering a grid back into palette artwork.
//!
//! A rendered mask classifies back into the grid it came from when it is
//! sampled with the same layout at the same image size.

use crate::context::{BattleMapContext, MapSource};
use crate::grid::{Grid, HexCell};
use crate::hex::{AxialCoord, HexLayout, LayoutError, PixelPoint};
use crate::terrain::TerrainType;
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Smallest hex radius the editor allows.
pub const EDITOR_RADIUS_MIN: f64 = 12.0;

/// Largest hex radius the editor allows.
pub const EDITOR_RADIUS_MAX: f64 = 80.0;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid hex size: {0}")]
    Layout(#[from] LayoutError),
    #[error("cell ({q}, {r}) lies outside a {rows}x{cols} grid")]
    CellOutOfBounds {
        q: i32,
        r: i32,
        rows: usize,
        cols: usize,
    },
    #[error("grid of {rows}x{cols} is too large to edit")]
    GridTooLarge { rows: usize, cols: usize },
    #[error("failed to encode map mask: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to access editor file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed editor data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One painted cell in the editor's JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorCell {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub terrain: TerrainType,
}

/// The editor's save format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorExport {
    pub hex_size: f64,
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<EditorCell>,
}

impl EditorExport {
    /// Snapshot a map.
    pub fn from_map(map: &BattleMapContext) -> Self {
        let grid = map.grid();
        Self {
            hex_size: map.layout().radius(),
            cols: grid.cols(),
            rows: grid.rows(),
            cells: grid
                .cells()
                .map(|cell| EditorCell {
                    q: cell.q,
                    r: cell.r,
                    terrain: cell.terrain,
                })
                .collect(),
        }
    }

    /// Rebuild a map, placing `(0, 0)` at `origin`.
    pub fn to_map(&self, origin: PixelPoint) -> Result<BattleMapContext, EditorError> {
        let layout = HexLayout::new(self.hex_size, origin)?;
        if Grid::checked_size(self.rows, self.cols).is_err() {
            return Err(EditorError::GridTooLarge {
                rows: self.rows,
                cols: self.cols,
            });
        }

        let mut grid = Grid::new(self.rows, self.cols);
        for cell in &self.cells {
            let coord = AxialCoord::new(cell.q, cell.r);
            if !grid.insert(HexCell::new(coord, &layout, cell.terrain)) {
                return Err(EditorError::CellOutOfBounds {
                    q: cell.q,
                    r: cell.r,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
        }
        Ok(BattleMapContext::from_grid(layout, grid, MapSource::Authored))
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Image size that shows every cell of a grid in full.
pub fn mask_size(grid: &Grid, layout: &HexLayout) -> (u32, u32) {
    let (mut width, mut height) = (1.0_f64, 1.0_f64);
    for cell in grid.cells() {
        for corner in layout.corners_at(cell.center()) {
            width = width.max(corner.x.ceil());
            height = height.max(corner.y.ceil());
        }
    }
    (width as u32, height as u32)
}

/// Paint a grid in the authoring palette.
///
/// Pixels outside every existing cell are void white.
pub fn render_mask(grid: &Grid, layout: &HexLayout, width: u32, height: u32) -> RgbaImage {
    let background = TerrainType::Void.mask_color();
    RgbaImage::from_fn(width, height, |x, y| {
        let center = PixelPoint::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let [r, g, b] = grid
            .cell_at_pixel(layout, center)
            .map_or(background, |cell| cell.terrain.mask_color());
        Rgba([r, g, b, 255])
    })
}

/// Encode a mask as PNG bytes.
pub fn encode_mask_png(mask: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// A battle map open for editing, with the currently selected brush.
#[derive(Clone, Debug)]
pub struct MapEditor {
    map: BattleMapContext,
    brush: TerrainType,
}

impl MapEditor {
    pub fn new(map: BattleMapContext) -> Self {
        Self {
            map,
            brush: TerrainType::Wall,
        }
    }

    /// Start from an all-ground rectangle.
    pub fn blank(rows: usize, cols: usize, layout: HexLayout) -> Self {
        let grid = Grid::filled(rows, cols, &layout, TerrainType::Ground);
        Self::new(BattleMapContext::from_grid(layout, grid, MapSource::Authored))
    }

    pub fn map(&self) -> &BattleMapContext {
        &self.map
    }

    pub fn into_map(self) -> BattleMapContext {
        self.map
    }

    pub fn brush(&self) -> TerrainType {
        self.brush
    }

    pub fn set_brush(&mut self, brush: TerrainType) {
        self.brush = brush;
    }

    /// Paint the cell under a pointer with the current brush.
    pub fn paint_at(&mut self, point: PixelPoint) -> Option<AxialCoord> {
        let coord = self.map.cell_at_pixel(point)?.coord();
        self.map.paint(&coord, self.brush).then_some(coord)
    }

    /// Paint every cell a drag passes over, rebuilding the blocked index once.
    pub fn paint_stroke<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = PixelPoint>,
    {
        let brush = self.brush;
        let coords: Vec<AxialCoord> = points
            .into_iter()
            .filter_map(|p| self.map.cell_at_pixel(p).map(HexCell::coord))
            .collect();
        self.map.paint_batch(coords.into_iter().map(|c| (c, brush)))
    }

    /// Eyedropper: take the brush from the cell under a pointer.
    pub fn pick_at(&mut self, point: PixelPoint) -> Option<TerrainType> {
        let terrain = self.map.cell_at_pixel(point)?.terrain;
        self.brush = terrain;
        Some(terrain)
    }

    /// Reset every cell to ground.
    pub fn clear(&mut self) -> usize {
        self.map.clear()
    }

    /// Set the hex radius, clamped to the editor's range. Returns the radius applied.
    pub fn resize(&mut self, radius: f64) -> Result<f64, EditorError> {
        let radius = radius.max(EDITOR_RADIUS_MIN).min(EDITOR_RADIUS_MAX);
        self.map.resize(radius)?;
        Ok(radius)
    }

    pub fn export(&self) -> EditorExport {
        EditorExport::from_map(&self.map)
    }

    pub fn export_json(&self) -> Result<String, EditorError> {
        self.export().to_json()
    }

    /// Replace the map with an import, keeping the current origin.
    ///
    /// The open map is left untouched if the import is invalid.
    pub fn import(&mut self, export: &EditorExport) -> Result<(), EditorError> {
        self.map = export.to_map(self.map.layout().origin())?;
        info!(
            rows = export.rows,
            cols = export.cols,
            cells = export.cells.len(),
            "imported battle map"
        );
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), EditorError> {
        self.import(&EditorExport::from_json(json)?)
    }

    /// Render the open map in the authoring palette, sized to fit every cell.
    pub fn render_mask(&self) -> RgbaImage {
        let (width, height) = mask_size(self.map.grid(), self.map.layout());
        render_mask(self.map.grid(), self.map.layout(), width, height)
    }

    pub fn save_mask(&self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        std::fs::write(path, encode_mask_png(&self.render_mask())?)?;
        Ok(())
    }
}
