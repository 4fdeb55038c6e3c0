//! Units standing on a battle map, viewed through [`ChainQueries`].

use crate::chain::{resolve_chain, ChainAttack, ChainQueries, ChainResult};
use crate::context::BattleMapContext;
use crate::elements::ElementMultiplierTable;
use crate::hex::AxialCoord;
use crate::unit::{Unit, UnitPlacement};

/// Borrowed snapshot of a map and its unit placement.
///
/// Chains bounce between passable neighbors only: walls, voids and missing
/// cells break the path.
#[derive(Clone, Copy, Debug)]
pub struct Battlefield<'a> {
    map: &'a BattleMapContext,
    units: &'a UnitPlacement,
}

impl<'a> Battlefield<'a> {
    pub fn new(map: &'a BattleMapContext, units: &'a UnitPlacement) -> Self {
        Self { map, units }
    }

    pub fn map(&self) -> &'a BattleMapContext {
        self.map
    }

    pub fn units(&self) -> &'a UnitPlacement {
        self.units
    }

    /// Resolve a chain attack on this battlefield.
    pub fn resolve_chain(
        &self,
        attack: &ChainAttack<AxialCoord>,
        table: &ElementMultiplierTable,
    ) -> ChainResult<AxialCoord> {
        resolve_chain(attack, table, self)
    }
}

impl ChainQueries for Battlefield<'_> {
    type Tile = AxialCoord;

    fn neighbors(&self, tile: &AxialCoord) -> Vec<AxialCoord> {
        self.map.passable_neighbors(tile)
    }

    fn unit_at(&self, tile: &AxialCoord) -> Option<Unit> {
        self.units.unit_at(tile).cloned()
    }
}
