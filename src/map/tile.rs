//! Map cells and their feature bitmask

use serde::{Deserialize, Serialize};

use crate::core::types::Continent;
use crate::map::terrain::Terrain;

/// Bitmask of per-tile features (improvements, hazards, geography)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features(pub u16);

impl Features {
    pub const IRRIGATION: Features = Features(1 << 0);
    pub const FARMLAND: Features = Features(1 << 1);
    pub const MINE: Features = Features(1 << 2);
    pub const ROAD: Features = Features(1 << 3);
    pub const RAILROAD: Features = Features(1 << 4);
    pub const POLLUTION: Features = Features(1 << 5);
    pub const FALLOUT: Features = Features(1 << 6);
    pub const RIVER: Features = Features(1 << 7);
    pub const RESOURCE: Features = Features(1 << 8);

    pub fn none() -> Self {
        Features(0)
    }

    pub fn has(&self, other: Features) -> bool {
        self.0 & other.0 != 0
    }

    pub fn with(mut self, other: Features) -> Self {
        self.0 |= other.0;
        self
    }

    pub fn without(mut self, other: Features) -> Self {
        self.0 &= !other.0;
        self
    }

    pub fn set(&mut self, other: Features) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self, other: Features) {
        self.0 &= !other.0;
    }
}

/// One map cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub features: Features,
    pub continent: Continent,
}

impl Tile {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            features: Features::none(),
            continent: 0,
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// A copy of this tile with the given terrain and features, used for
    /// what-if improvement valuation without touching shared state
    pub fn overridden(&self, terrain: Terrain, features: Features) -> Self {
        Self {
            terrain,
            features,
            continent: self.continent,
        }
    }

    /// Wet tiles support irrigation on adjacent cells
    pub fn is_wet(&self) -> bool {
        self.terrain.is_water()
            || self.features.has(Features::RIVER)
            || self.features.has(Features::IRRIGATION)
    }
}
