//! Elemental damage multipliers.
//!
//! Loaded from JSON shaped `{ "Fire": { "Water": 0.5, "Plant": 2 }, ... }`.
//! Any pairing that isn't listed deals normal damage (multiplier 1), and a
//! multiplier of 0 means the defender is immune.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Multiplier used for pairings missing from the table.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ElementTableError {
    #[error("multiplier for {attack} -> {defense} must be finite and non-negative, got {value}")]
    InvalidMultiplier {
        attack: String,
        defense: String,
        value: f64,
    },
    #[error("failed to read element table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed element table: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Attack element -> defense element -> damage multiplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementMultiplierTable {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ElementMultiplierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiplier for an attack element hitting a defense element.
    pub fn multiplier(&self, attack: &str, defense: &str) -> f64 {
        self.rows
            .get(attack)
            .and_then(|row| row.get(defense))
            .copied()
            .unwrap_or(DEFAULT_MULTIPLIER)
    }

    /// Is the defender immune (multiplier 0) to this attack element?
    pub fn is_immune(&self, attack: &str, defense: &str) -> bool {
        self.multiplier(attack, defense) == 0.0
    }

    /// Set one pairing.
    pub fn set(
        &mut self,
        attack: impl Into<String>,
        defense: impl Into<String>,
        value: f64,
    ) -> Result<(), ElementTableError> {
        let attack = attack.into();
        let defense = defense.into();
        check_multiplier(&attack, &defense, value)?;
        self.rows.entry(attack).or_default().insert(defense, value);
        Ok(())
    }

    /// Builder-style [`set`](Self::set), for tests and fixtures.
    pub fn with(
        mut self,
        attack: impl Into<String>,
        defense: impl Into<String>,
        value: f64,
    ) -> Result<Self, ElementTableError> {
        self.set(attack, defense, value)?;
        Ok(self)
    }

    /// Reject negative or non-finite multipliers.
    pub fn validate(&self) -> Result<(), ElementTableError> {
        for (attack, row) in &self.rows {
            for (defense, value) in row {
                check_multiplier(attack, defense, *value)?;
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ElementTableError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElementTableError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, ElementTableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_multiplier(attack: &str, defense: &str, value: f64) -> Result<(), ElementTableError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ElementTableError::InvalidMultiplier {
            attack: attack.to_string(),
            defense: defense.to_string(),
            value,
        })
    }
}
