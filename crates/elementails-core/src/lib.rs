//! ElemenTails Core Library
//!
//! This crate contains the battle map logic for ElemenTails, a hex-based
//! tactical battler where units trade elemental chain attacks.
//!
//! # Design Principles
//!
//! - **No UI dependencies**: This crate is purely battle logic
//! - **Deterministic**: Same inputs (and seed) always produce same outputs
//! - **Serializable**: Maps, calibrations and settings save/load via serde
//! - **Degrade, don't fail**: Missing artwork or spawns fall back with a warning

// Hex geometry
pub mod hex;

// Map data
pub mod grid;
pub mod terrain;

// Map ingestion
pub mod calibration;
pub mod classify;

// Map generation and spawns
pub mod mapgen;
pub mod spawn;

// Derived map queries
pub mod blocked;
pub mod line_of_sight;

// The loaded battle map
pub mod context;
pub mod settings;

// Authoring tools
pub mod editor;
pub mod template;

// Units and chain attacks
pub mod battlefield;
pub mod chain;
pub mod elements;
pub mod unit;

// Re-exports for convenience
pub use battlefield::Battlefield;
pub use blocked::BlockedTileIndex;
pub use calibration::{
    derive_calibration, CalibrationEngine, CalibrationError, CalibrationOutcome,
    CalibrationSettings, CalibrationState, CalibrationStep, SavedCalibration,
};
pub use chain::{
    resolve_chain, ChainAttack, ChainHit, ChainQueries, ChainResult, FnQueries,
    DEFAULT_CHAIN_RANGE,
};
pub use classify::{decode_map_image, load_map_image, MapImageClassifier, MapLoadError};
pub use context::{BattleMapContext, MapSource};
pub use editor::{render_mask, EditorError, EditorExport, MapEditor};
pub use elements::{ElementMultiplierTable, ElementTableError};
pub use grid::{Grid, GridError, HexCell, MAX_GRID_CELLS};
pub use hex::{AxialCoord, HexLayout, LayoutError, PixelPoint};
pub use line_of_sight::LineOfSight;
pub use mapgen::{generate_fallback_grid, FallbackGridConfig, RandomSource, SeededRng};
pub use settings::{BattleMapSettings, SettingsError};
pub use spawn::{plan_spawns, SpawnPlan};
pub use template::{Assignment, AssignmentIndices, HexTemplate, TemplateError};
pub use terrain::{PaletteThresholds, TerrainType};
pub use unit::{Unit, UnitPlacement};
