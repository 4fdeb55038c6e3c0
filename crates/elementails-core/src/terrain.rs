//! Terrain types for battle map cells and the authoring palette that maps
//! artwork colors onto them.

use serde::{Deserialize, Serialize};

/// Classification label of a battle map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerrainType {
    #[default]
    Ground,
    Wall,
    Void,
    PlayerSpawn,
    EnemySpawn,
}

impl TerrainType {
    /// Walls and voids can't be entered or seen through.
    pub const fn is_blocked(&self) -> bool {
        matches!(self, TerrainType::Wall | TerrainType::Void)
    }

    /// Ground-like terrain a unit may stand on.
    pub const fn is_walkable(&self) -> bool {
        !self.is_blocked()
    }

    pub const fn is_spawn(&self) -> bool {
        matches!(self, TerrainType::PlayerSpawn | TerrainType::EnemySpawn)
    }

    /// Name used in exported JSON.
    pub const fn name(&self) -> &'static str {
        match self {
            TerrainType::Ground => "ground",
            TerrainType::Wall => "wall",
            TerrainType::Void => "void",
            TerrainType::PlayerSpawn => "playerSpawn",
            TerrainType::EnemySpawn => "enemySpawn",
        }
    }

    /// Color painted for this terrain when exporting a mask image.
    ///
    /// Every color classifies back to the same terrain under the default
    /// [`PaletteThresholds`].
    pub const fn mask_color(&self) -> [u8; 3] {
        match self {
            TerrainType::Void => [255, 255, 255],
            TerrainType::Wall => [0, 0, 0],
            TerrainType::PlayerSpawn => [59, 130, 246],
            TerrainType::EnemySpawn => [220, 38, 38],
            TerrainType::Ground => [148, 163, 184],
        }
    }

    /// Get all terrain variants.
    pub const fn all() -> &'static [TerrainType] {
        &[
            TerrainType::Ground,
            TerrainType::Wall,
            TerrainType::Void,
            TerrainType::PlayerSpawn,
            TerrainType::EnemySpawn,
        ]
    }
}

impl std::fmt::Display for TerrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Color thresholds of the authoring palette.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteThresholds {
    /// All channels above this are void.
    pub near_white: u8,
    /// All channels below this are wall.
    pub near_black: u8,
    /// Minimum value of the dominant channel for a spawn color.
    pub spawn_dominant: u8,
    /// Maximum value of the other channels for a spawn color.
    pub spawn_max_other: u8,
    /// Maximum green for player spawn blue (palette blues carry some green).
    pub player_max_green: u8,
    /// Channel spread below which a pixel counts as gray.
    pub gray_spread: u8,
    /// Gray brighter than this collapses to void.
    pub gray_light: u8,
    /// Gray darker than this collapses to wall.
    pub gray_dark: u8,
}

impl Default for PaletteThresholds {
    fn default() -> Self {
        Self {
            near_white: 245,
            near_black: 15,
            spawn_dominant: 160,
            spawn_max_other: 110,
            player_max_green: 170,
            gray_spread: 12,
            gray_light: 230,
            gray_dark: 30,
        }
    }
}

impl PaletteThresholds {
    /// Classify one RGB sample. Total: every color maps to exactly one terrain.
    pub fn classify(&self, [r, g, b]: [u8; 3]) -> TerrainType {
        if r > self.near_white && g > self.near_white && b > self.near_white {
            return TerrainType::Void;
        }
        if r < self.near_black && g < self.near_black && b < self.near_black {
            return TerrainType::Wall;
        }
        if r >= self.spawn_dominant && g <= self.spawn_max_other && b <= self.spawn_max_other {
            return TerrainType::EnemySpawn;
        }
        if b >= self.spawn_dominant && r <= self.spawn_max_other && g <= self.player_max_green {
            return TerrainType::PlayerSpawn;
        }

        // Anti-aliased or compressed artwork: near-gray extremes still
        // belong to void/wall rather than ground.
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max - min < self.gray_spread {
            let brightness = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
            if brightness > u16::from(self.gray_light) {
                return TerrainType::Void;
            }
            if brightness < u16::from(self.gray_dark) {
                return TerrainType::Wall;
            }
        }

        TerrainType::Ground
    }
}
