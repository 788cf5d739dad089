//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Index of a participant (player). Territory and claim grids pack one bit
/// per player, so at most 32 players are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// The player's bit in territory/claim bitmasks
    pub fn bit(&self) -> u32 {
        1 << self.0
    }
}

/// Unique identifier for a mobile unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Unique identifier for a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityId(pub u32);

/// Landmass identifier; land units without a ferry can only reach tiles on
/// their own continent
pub type Continent = u16;

/// Map position. `x` wraps east-west, `y` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Simulation turn counter
pub type Turn = u32;
