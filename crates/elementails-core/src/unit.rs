//! Units as seen by the battle map: an id, an element, and a tile.

use crate::hex::AxialCoord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A unit standing on the battle map.
///
/// `id` must be unique and stable for the duration of an attack resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub element: String,
}

impl Unit {
    pub fn new(id: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element: element.into(),
        }
    }
}

/// Live placement of units on tiles, maintained by the game loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    units: HashMap<AxialCoord, Unit>,
}

impl UnitPlacement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a unit, returning whoever was on the tile before.
    pub fn place(&mut self, tile: AxialCoord, unit: Unit) -> Option<Unit> {
        self.units.insert(tile, unit)
    }

    pub fn remove(&mut self, tile: &AxialCoord) -> Option<Unit> {
        self.units.remove(tile)
    }

    pub fn unit_at(&self, tile: &AxialCoord) -> Option<&Unit> {
        self.units.get(tile)
    }

    /// Tile of the unit with the given id.
    pub fn position_of(&self, id: &str) -> Option<AxialCoord> {
        self.units
            .iter()
            .find(|(_, unit)| unit.id == id)
            .map(|(tile, _)| *tile)
    }

    /// Move a unit between tiles. Fails if the source is empty or the target taken.
    pub fn move_unit(&mut self, from: &AxialCoord, to: AxialCoord) -> bool {
        if self.units.contains_key(&to) {
            return false;
        }
        match self.units.remove(from) {
            Some(unit) => {
                self.units.insert(to, unit);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AxialCoord, &Unit)> {
        self.units.iter()
    }
}
