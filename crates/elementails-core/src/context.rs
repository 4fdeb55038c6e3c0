//! The battle map as one unit of state.
//!
//! [`BattleMapContext`] owns the layout, the grid and the blocked tile index
//! together. Every operation that changes the grid goes through it, and
//! rebuilds the index before returning, so the two can't drift apart.

use crate::blocked::BlockedTileIndex;
use crate::calibration::CalibrationOutcome;
use crate::classify::{load_map_image, MapImageClassifier, MapLoadError};
use crate::grid::{Grid, HexCell};
use crate::hex::{AxialCoord, HexLayout, LayoutError, PixelPoint};
use crate::line_of_sight::LineOfSight;
use crate::mapgen::{generate_fallback_grid, FallbackGridConfig, RandomSource};
use crate::settings::BattleMapSettings;
use crate::spawn::{plan_spawns, SpawnPlan};
use crate::terrain::{PaletteThresholds, TerrainType};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Where the current grid came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapSource {
    /// Classified from map artwork.
    Image,
    /// Generated because the artwork was unavailable.
    Procedural,
    /// Built by hand in the editor or from a template.
    Authored,
}

/// Layout, grid and blocked index of the loaded battle map.
#[derive(Clone, Debug)]
pub struct BattleMapContext {
    layout: HexLayout,
    grid: Grid,
    blocked: BlockedTileIndex,
    source: MapSource,
}

impl BattleMapContext {
    pub fn from_grid(layout: HexLayout, grid: Grid, source: MapSource) -> Self {
        let blocked = BlockedTileIndex::from_grid(&grid);
        Self {
            layout,
            grid,
            blocked,
            source,
        }
    }

    /// Classify decoded artwork under a layout.
    pub fn from_image(image: &DynamicImage, layout: HexLayout, palette: &PaletteThresholds) -> Self {
        let grid = MapImageClassifier::new(layout, palette.clone()).classify_dynamic(image);
        Self::from_grid(layout, grid, MapSource::Image)
    }

    /// Generate a fallback field.
    pub fn procedural<R: RandomSource + ?Sized>(
        layout: HexLayout,
        config: &FallbackGridConfig,
        rng: &mut R,
    ) -> Self {
        let grid = generate_fallback_grid(&layout, config, rng);
        Self::from_grid(layout, grid, MapSource::Procedural)
    }

    /// Use the artwork if it loaded, otherwise fall back to a generated field.
    ///
    /// Never fails: a missing image degrades the battle, it doesn't stop it.
    pub fn from_image_or_fallback<R: RandomSource + ?Sized>(
        image: Result<DynamicImage, MapLoadError>,
        layout: HexLayout,
        settings: &BattleMapSettings,
        rng: &mut R,
    ) -> Self {
        match image {
            Ok(image) => Self::from_image(&image, layout, &settings.palette),
            Err(err) => {
                warn!(error = %err, "map image unavailable, generating fallback battle map");
                Self::procedural(layout, &settings.fallback, rng)
            }
        }
    }

    /// Load artwork from disk, falling back to a generated field.
    pub fn load<R: RandomSource + ?Sized>(
        path: impl AsRef<Path>,
        layout: HexLayout,
        settings: &BattleMapSettings,
        rng: &mut R,
    ) -> Self {
        Self::from_image_or_fallback(load_map_image(path), layout, settings, rng)
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn blocked(&self) -> &BlockedTileIndex {
        &self.blocked
    }

    pub fn source(&self) -> MapSource {
        self.source
    }

    pub fn line_of_sight(&self) -> LineOfSight<'_> {
        LineOfSight::new(&self.grid, &self.blocked)
    }

    pub fn has_line_of_sight(&self, from: AxialCoord, to: AxialCoord) -> bool {
        self.line_of_sight().has_line_of_sight(from, to)
    }

    /// Existing cell under a pixel.
    pub fn cell_at_pixel(&self, point: PixelPoint) -> Option<&HexCell> {
        self.grid.cell_at_pixel(&self.layout, point)
    }

    /// Terrain of a cell (the editor's eyedropper).
    pub fn pick(&self, coord: &AxialCoord) -> Option<TerrainType> {
        self.grid.terrain(coord)
    }

    /// Repaint one cell. Returns false when there is no cell there.
    pub fn paint(&mut self, coord: &AxialCoord, terrain: TerrainType) -> bool {
        self.paint_batch([(*coord, terrain)]) == 1
    }

    /// Repaint several cells, rebuilding the blocked index once.
    ///
    /// Returns how many cells existed and were repainted.
    pub fn paint_batch<I>(&mut self, edits: I) -> usize
    where
        I: IntoIterator<Item = (AxialCoord, TerrainType)>,
    {
        let painted = edits
            .into_iter()
            .filter(|(coord, terrain)| self.grid.set_terrain(coord, *terrain))
            .count();
        if painted > 0 {
            self.source = MapSource::Authored;
            self.rebuild_blocked();
        }
        painted
    }

    /// Reset every cell to ground.
    pub fn clear(&mut self) -> usize {
        let coords: Vec<AxialCoord> = self.grid.cells().map(HexCell::coord).collect();
        self.paint_batch(coords.into_iter().map(|c| (c, TerrainType::Ground)))
    }

    /// Change the hex radius, keeping every cell's terrain.
    pub fn resize(&mut self, radius: f64) -> Result<(), LayoutError> {
        self.layout = self.layout.with_radius(radius)?;
        self.grid.relayout(&self.layout);
        self.rebuild_blocked();
        Ok(())
    }

    /// Reclassify artwork under a new layout, replacing the grid wholesale.
    pub fn recalibrate(
        &mut self,
        layout: HexLayout,
        image: &DynamicImage,
        palette: &PaletteThresholds,
    ) {
        *self = Self::from_image(image, layout, palette);
    }

    /// Apply a finished calibration to the artwork.
    pub fn apply_calibration(
        &mut self,
        outcome: &CalibrationOutcome,
        image: &DynamicImage,
        palette: &PaletteThresholds,
    ) {
        info!(
            radius = outcome.layout.radius(),
            misaligned = outcome.misaligned,
            "applying calibration to battle map"
        );
        self.recalibrate(outcome.layout, image, palette);
    }

    /// Spawn tiles for both sides, with random ground standing in for missing ones.
    pub fn spawn_plan<R: RandomSource + ?Sized>(&self, fallback_count: usize, rng: &mut R) -> SpawnPlan {
        plan_spawns(&self.grid, fallback_count, rng)
    }

    /// Neighbors a unit could step or bounce to: existing and not blocked.
    pub fn passable_neighbors(&self, coord: &AxialCoord) -> Vec<AxialCoord> {
        self.grid
            .neighbors(coord)
            .into_iter()
            .filter(|c| !self.blocked.is_blocked(c))
            .collect()
    }

    fn rebuild_blocked(&mut self) {
        self.blocked = BlockedTileIndex::from_grid(&self.grid);
    }
}
