//! Terrain kinds and their static rule table
//!
//! Yields, improvement results, and build times are fixed per terrain; the
//! engine only ever reads them through `Terrain::spec`.

use serde::{Deserialize, Serialize};

/// Terrain types affecting yields, movement, and improvement legality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Ocean,
    Glacier,
    Desert,
    Forest,
    Grassland,
    Hills,
    Jungle,
    Mountains,
    Plains,
    Swamp,
    Tundra,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::Grassland
    }
}

/// Static rules for one terrain kind
#[derive(Debug, Clone, Copy)]
pub struct TerrainSpec {
    /// Base food/shield/trade yields before improvements
    pub food: i32,
    pub shields: i32,
    pub trade: i32,
    /// Defense multiplier in tens of percent (10 = no bonus)
    pub defense_bonus: i32,
    /// Movement cost in move points to enter this tile
    pub move_cost: u32,
    /// Terrain left behind by irrigating, if irrigation is possible at all.
    /// Equal to the terrain itself when irrigating just adds the feature.
    pub irrigation_result: Option<Terrain>,
    /// Extra food from the irrigation feature
    pub irrigation_food_incr: i32,
    /// Extra shields from the mine feature (mining legality is checked
    /// separately; only hills and mountains qualify)
    pub mining_shield_incr: i32,
    /// Extra trade from the road feature
    pub road_trade_incr: i32,
    /// Terrain left behind by heavy transformation, if any
    pub transform_result: Option<Terrain>,
    /// Worker turns for each improvement on this terrain
    pub irrigation_time: i32,
    pub mining_time: i32,
    pub transform_time: i32,
    pub road_time: i32,
}

impl Terrain {
    /// Static rule entry for this terrain
    pub fn spec(&self) -> &'static TerrainSpec {
        use Terrain::*;
        match self {
            Ocean => &TerrainSpec {
                food: 1,
                shields: 0,
                trade: 2,
                defense_bonus: 10,
                move_cost: 3,
                irrigation_result: None,
                irrigation_food_incr: 0,
                mining_shield_incr: 0,
                road_trade_incr: 0,
                transform_result: None,
                irrigation_time: 0,
                mining_time: 0,
                transform_time: 0,
                road_time: 0,
            },
            Glacier => &TerrainSpec {
                food: 0,
                shields: 0,
                trade: 0,
                defense_bonus: 10,
                move_cost: 6,
                irrigation_result: None,
                irrigation_food_incr: 0,
                mining_shield_incr: 0,
                road_trade_incr: 0,
                transform_result: Some(Tundra),
                irrigation_time: 0,
                mining_time: 10,
                transform_time: 51,
                road_time: 4,
            },
            Desert => &TerrainSpec {
                food: 0,
                shields: 1,
                trade: 0,
                defense_bonus: 10,
                move_cost: 3,
                irrigation_result: Some(Desert),
                irrigation_food_incr: 1,
                mining_shield_incr: 1,
                road_trade_incr: 1,
                transform_result: Some(Plains),
                irrigation_time: 5,
                mining_time: 5,
                transform_time: 24,
                road_time: 2,
            },
            Forest => &TerrainSpec {
                food: 1,
                shields: 2,
                trade: 0,
                defense_bonus: 15,
                move_cost: 6,
                irrigation_result: Some(Plains),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 0,
                transform_result: Some(Grassland),
                irrigation_time: 5,
                mining_time: 15,
                transform_time: 24,
                road_time: 4,
            },
            Grassland => &TerrainSpec {
                food: 2,
                shields: 0,
                trade: 0,
                defense_bonus: 10,
                move_cost: 3,
                irrigation_result: Some(Grassland),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 1,
                transform_result: Some(Hills),
                irrigation_time: 5,
                mining_time: 10,
                transform_time: 24,
                road_time: 2,
            },
            Hills => &TerrainSpec {
                food: 1,
                shields: 0,
                trade: 0,
                defense_bonus: 20,
                move_cost: 6,
                irrigation_result: Some(Hills),
                irrigation_food_incr: 1,
                mining_shield_incr: 3,
                road_trade_incr: 0,
                transform_result: Some(Plains),
                irrigation_time: 10,
                mining_time: 10,
                transform_time: 24,
                road_time: 4,
            },
            Jungle => &TerrainSpec {
                food: 1,
                shields: 0,
                trade: 0,
                defense_bonus: 15,
                move_cost: 6,
                irrigation_result: Some(Grassland),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 0,
                transform_result: Some(Plains),
                irrigation_time: 15,
                mining_time: 15,
                transform_time: 24,
                road_time: 4,
            },
            Mountains => &TerrainSpec {
                food: 0,
                shields: 1,
                trade: 0,
                defense_bonus: 30,
                move_cost: 9,
                irrigation_result: None,
                irrigation_food_incr: 0,
                mining_shield_incr: 1,
                road_trade_incr: 0,
                transform_result: Some(Hills),
                irrigation_time: 0,
                mining_time: 10,
                transform_time: 24,
                road_time: 6,
            },
            Plains => &TerrainSpec {
                food: 1,
                shields: 1,
                trade: 0,
                defense_bonus: 10,
                move_cost: 3,
                irrigation_result: Some(Plains),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 1,
                transform_result: Some(Grassland),
                irrigation_time: 5,
                mining_time: 10,
                transform_time: 24,
                road_time: 2,
            },
            Swamp => &TerrainSpec {
                food: 1,
                shields: 0,
                trade: 0,
                defense_bonus: 15,
                move_cost: 6,
                irrigation_result: Some(Grassland),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 0,
                transform_result: Some(Grassland),
                irrigation_time: 15,
                mining_time: 15,
                transform_time: 36,
                road_time: 4,
            },
            Tundra => &TerrainSpec {
                food: 1,
                shields: 0,
                trade: 0,
                defense_bonus: 10,
                move_cost: 3,
                irrigation_result: Some(Tundra),
                irrigation_food_incr: 1,
                mining_shield_incr: 0,
                road_trade_incr: 1,
                transform_result: Some(Desert),
                irrigation_time: 5,
                mining_time: 10,
                transform_time: 24,
                road_time: 2,
            },
        }
    }

    /// Water tiles cannot host settlements or land improvements
    pub fn is_water(&self) -> bool {
        matches!(self, Terrain::Ocean)
    }

    /// Terrain set eligible for heavy transformation
    pub fn can_transform(&self) -> bool {
        matches!(
            self,
            Terrain::Glacier
                | Terrain::Desert
                | Terrain::Jungle
                | Terrain::Swamp
                | Terrain::Tundra
                | Terrain::Mountains
        )
    }

    /// Terrain set a settlement may be founded on. Deserts qualify only
    /// when a special resource makes them livable; that check needs the
    /// tile and lives in `GameMap::is_legal_city_terrain`.
    pub fn allows_city_without_resource(&self) -> bool {
        matches!(self, Terrain::Grassland | Terrain::Plains)
    }
}
