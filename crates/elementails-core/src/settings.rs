//! Battle map settings and configuration.

use crate::calibration::CalibrationSettings;
use crate::chain::DEFAULT_CHAIN_RANGE;
use crate::grid::{Grid, GridError};
use crate::mapgen::FallbackGridConfig;
use crate::terrain::PaletteThresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration for loading and playing on a battle map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleMapSettings {
    /// Radius bounds and misalignment tolerance for calibration.
    pub calibration: CalibrationSettings,
    /// Authoring palette thresholds.
    pub palette: PaletteThresholds,
    /// Shape of the field generated when the map image can't be loaded.
    pub fallback: FallbackGridConfig,
    /// Hop range of chain attacks when the caller doesn't say otherwise.
    pub default_chain_range: u32,
    /// Spawn tiles picked per side when a map has none of its own.
    pub fallback_spawn_count: usize,
}

impl Default for BattleMapSettings {
    fn default() -> Self {
        Self {
            calibration: CalibrationSettings::default(),
            palette: PaletteThresholds::default(),
            fallback: FallbackGridConfig::default(),
            default_chain_range: DEFAULT_CHAIN_RANGE,
            fallback_spawn_count: 4,
        }
    }
}

impl BattleMapSettings {
    /// Validate settings and return the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let cal = &self.calibration;
        if !(cal.radius_min.is_finite() && cal.radius_min > 0.0) {
            return Err(SettingsError::InvalidRadiusBounds);
        }
        if !(cal.radius_max.is_finite() && cal.radius_max >= cal.radius_min) {
            return Err(SettingsError::InvalidRadiusBounds);
        }
        if !(cal.misalignment_tolerance.is_finite() && cal.misalignment_tolerance > 0.0) {
            return Err(SettingsError::InvalidTolerance);
        }
        if self.fallback.rows == 0 || self.fallback.cols == 0 {
            return Err(SettingsError::EmptyFallbackGrid);
        }
        Grid::checked_size(self.fallback.rows, self.fallback.cols)?;
        if !(0.0..=1.0).contains(&self.fallback.wall_chance) {
            return Err(SettingsError::InvalidWallChance(self.fallback.wall_chance));
        }
        if self.fallback_spawn_count == 0 {
            return Err(SettingsError::NoFallbackSpawns);
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Errors that can occur when validating or loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("calibration radius bounds must be positive and ordered")]
    InvalidRadiusBounds,
    #[error("misalignment tolerance must be positive")]
    InvalidTolerance,
    #[error("fallback grid needs at least one row and one column")]
    EmptyFallbackGrid,
    #[error("fallback grid: {0}")]
    FallbackGridTooLarge(#[from] GridError),
    #[error("wall chance must be between 0 and 1, got {0}")]
    InvalidWallChance(f64),
    #[error("fallback spawn count must be at least 1")]
    NoFallbackSpawns,
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Serialization(#[from] serde_json::Error),
}
