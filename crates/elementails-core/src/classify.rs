//! Map image ingestion: samples artwork at hex centers and classifies each
//! sample into a terrain type.

use crate::grid::{Grid, GridError, HexCell};
use crate::hex::{AxialCoord, HexLayout, PixelPoint};
use crate::terrain::{PaletteThresholds, TerrainType};
use image::{DynamicImage, RgbImage};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to obtain map artwork.
#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("Failed to read map image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode map image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Load map artwork from disk.
pub fn load_map_image(path: impl AsRef<Path>) -> Result<DynamicImage, MapLoadError> {
    let bytes = std::fs::read(path)?;
    decode_map_image(&bytes)
}

/// Decode map artwork from an in-memory buffer (format is sniffed).
pub fn decode_map_image(bytes: &[u8]) -> Result<DynamicImage, MapLoadError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Grid extent `(rows, cols)` that covers an image without walking past it.
///
/// Fails when the radius is so small for the image that the grid would
/// exceed [`crate::grid::MAX_GRID_CELLS`].
pub fn grid_extent(
    width: u32,
    height: u32,
    layout: &HexLayout,
) -> Result<(usize, usize), GridError> {
    let cols = (f64::from(width) / layout.step_x()).ceil() as usize;
    let rows = (f64::from(height) / layout.step_y()).ceil() as usize;
    Grid::checked_size(rows, cols)?;
    Ok((rows, cols))
}

/// Samples a raster image on a hex layout.
#[derive(Clone, Debug)]
pub struct MapImageClassifier {
    layout: HexLayout,
    palette: PaletteThresholds,
}

impl MapImageClassifier {
    pub fn new(layout: HexLayout, palette: PaletteThresholds) -> Self {
        Self { layout, palette }
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    /// Color of the pixel under a point, or `None` outside the image.
    fn sample(image: &RgbImage, point: PixelPoint) -> Option<[u8; 3]> {
        let x = point.x.floor();
        let y = point.y.floor();
        if x < 0.0 || y < 0.0 || x >= f64::from(image.width()) || y >= f64::from(image.height()) {
            return None;
        }
        Some(image.get_pixel(x as u32, y as u32).0)
    }

    /// Build a grid from an RGB image.
    ///
    /// Cells whose center falls outside the image stay empty. A layout too
    /// fine for the image yields an empty grid.
    pub fn classify(&self, image: &RgbImage) -> Grid {
        let (rows, cols) = match grid_extent(image.width(), image.height(), &self.layout) {
            Ok(extent) => extent,
            Err(err) => {
                warn!(radius = self.layout.radius(), %err, "map image not classified");
                return Grid::new(0, 0);
            }
        };
        let mut grid = Grid::new(rows, cols);

        for r in 0..rows as i32 {
            for q in 0..cols as i32 {
                let coord = AxialCoord::new(q, r);
                let center = self.layout.axial_to_pixel(coord);
                if let Some(rgb) = Self::sample(image, center) {
                    let terrain = self.palette.classify(rgb);
                    grid.insert(HexCell::new(coord, &self.layout, terrain));
                }
            }
        }

        debug!(
            rows,
            cols,
            cells = grid.cell_count(),
            walls = grid.count(TerrainType::Wall),
            voids = grid.count(TerrainType::Void),
            player_spawns = grid.count(TerrainType::PlayerSpawn),
            enemy_spawns = grid.count(TerrainType::EnemySpawn),
            "classified map image"
        );
        grid
    }

    /// Build a grid from any decoded image; alpha is ignored.
    pub fn classify_dynamic(&self, image: &DynamicImage) -> Grid {
        self.classify(&image.to_rgb8())
    }
}
