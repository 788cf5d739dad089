//! Engine configuration with documented constants
//!
//! All game-balance numbers used by the valuation and assignment engine are
//! collected here. They are tunable, but downstream scoring was calibrated
//! against the defaults, so changing one value usually requires re-tuning
//! several others.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Result;

/// Tunable weighting constants for the settler engine
///
/// Deserializable from TOML; missing fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === DISCOUNTING ===
    /// Depreciation base for the discounted-value function
    ///
    /// A benefit one turn away is worth (mort - 1)/mort of its face value.
    /// At 24, value halves roughly every 17 turns. The batch shortcut in
    /// `discount` (×3/5 per 12 turns) is only accurate while this stays 24.
    pub mort: i32,

    // === YIELD WEIGHTING ===
    /// Relative worth of one food point
    ///
    /// Food is weighted above shields and trade because surplus food
    /// compounds through settlement growth.
    pub food_weighting: i32,

    /// Relative worth of one production (shield) point
    pub shield_weighting: i32,

    /// Relative worth of one trade point
    pub trade_weighting: i32,

    // === IMPROVEMENT SCAN ===
    /// Score multiplier for candidate tiles currently worked by a citizen
    ///
    /// Improving a tile someone is standing on pays off immediately, so
    /// worked tiles weigh double the idle-tile multiplier.
    pub used_tile_weight: i32,

    /// Score multiplier for candidate tiles not currently worked
    pub unused_tile_weight: i32,

    /// Flat connectivity bonus per useful adjacent road link
    pub road_connect_bonus: i32,

    /// Flat connectivity bonus per useful adjacent railroad link
    pub railroad_connect_bonus: i32,

    /// Maximum travel cost, in multiples of the unit's move rate, at which
    /// an improvement target is still worth considering
    pub travel_threshold: u32,

    // === SITE EVALUATION ===
    /// Food points a settlement must bank before growing one step
    ///
    /// Drives the delay growth of the greedy radius fill: richer sites
    /// fill their food box faster and discount later tiles less.
    pub foodbox: i32,

    /// Maximum growth steps simulated by the greedy radius fill
    pub max_growth_steps: u32,

    /// Shield-weighted flat deterrent for walls and defenders at a new site
    pub defense_deterrent: i32,

    /// Shield component of the settler-consumption deterrent
    pub settler_deterrent_shields: i32,

    /// Food component of the settler-consumption deterrent
    pub settler_deterrent_food: i32,

    /// Flat per-settlement science credit, in mort-scaled points
    pub science_bonus: i32,

    /// Settlement size at or above which a site with an existing settlement
    /// stops accepting immigration
    pub add_to_size_limit: u8,

    // === FOUNDER SCAN ===
    /// Half-width of the neighborhood scanned for new settlement sites
    pub founder_scan_radius: i32,

    /// Chebyshev distance below which a same-continent site is always
    /// eligible; beyond it only off-continent sites are considered
    pub founder_near_limit: i32,

    /// Rule-mandated minimum spacing between settlements
    pub min_city_distance: i32,

    /// Restrict automated founding to the picky site screen (legal-terrain
    /// table plus wide spacing) instead of any land tile
    pub strict_site_terrain: bool,

    /// Divisor applied to the virtual sea-crossing estimate when no physical
    /// route exists yet
    pub virtual_sea_divisor: u32,

    /// Maximum travel cost at which an idle ferry is considered available
    pub ferry_search_limit: u32,

    // === HAZARD PRESSURE ===
    /// Scale factor for the global-warming pressure fed into pollution and
    /// fallout cleanup bonuses
    pub warming_factor: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mort: 24,

            food_weighting: 19,
            shield_weighting: 17,
            trade_weighting: 12,

            used_tile_weight: 64,
            unused_tile_weight: 32,
            road_connect_bonus: 8,
            railroad_connect_bonus: 4,
            travel_threshold: 12,

            foodbox: 10,
            max_growth_steps: 20,
            defense_deterrent: 110,
            settler_deterrent_shields: 40,
            settler_deterrent_food: 30,
            science_bonus: 8,
            add_to_size_limit: 8,

            founder_scan_radius: 11,
            founder_near_limit: 8,
            min_city_distance: 2,
            strict_site_terrain: false,
            virtual_sea_divisor: 9,
            ferry_search_limit: 22,

            warming_factor: 32,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        use crate::core::error::HomesteadError;

        if self.mort < 2 {
            return Err(HomesteadError::InvalidConfig(format!(
                "mort ({}) must be at least 2",
                self.mort
            )));
        }
        if self.used_tile_weight < self.unused_tile_weight {
            return Err(HomesteadError::InvalidConfig(format!(
                "used_tile_weight ({}) should be >= unused_tile_weight ({})",
                self.used_tile_weight, self.unused_tile_weight
            )));
        }
        if self.foodbox <= 0 {
            return Err(HomesteadError::InvalidConfig(
                "foodbox must be positive".into(),
            ));
        }
        if self.founder_scan_radius < 1 {
            return Err(HomesteadError::InvalidConfig(
                "founder_scan_radius must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Food weighting as seen by a settlement of the given size
    ///
    /// Small settlements value food far above everything else; the weight
    /// falls off as the settlement grows and `food_weighting` itself is the
    /// size-2 point of the curve.
    pub fn food_weight_for_size(&self, size: u8) -> i32 {
        let n = i32::from(size.max(1));
        ((self.food_weighting * 4) / (n + 2)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_food_weight_falls_with_size() {
        let config = EngineConfig::default();
        assert!(config.food_weight_for_size(1) > config.food_weight_for_size(4));
        assert_eq!(config.food_weight_for_size(2), config.food_weighting);
        // never collapses to zero
        assert!(config.food_weight_for_size(200) >= 1);
    }

    #[test]
    fn test_toml_round_trip_with_overrides() {
        let config = EngineConfig::from_toml_str("mort = 24\nfoodbox = 14\n").unwrap();
        assert_eq!(config.foodbox, 14);
        // unspecified fields keep their defaults
        assert_eq!(config.food_weighting, 19);
    }

    #[test]
    fn test_rejects_degenerate_mort() {
        assert!(EngineConfig::from_toml_str("mort = 1").is_err());
    }
}
