//! Participants and their per-turn AI state

use serde::{Deserialize, Serialize};

use crate::core::types::PlayerId;

/// Technology gates the engine cares about. Everything else the rule tables
/// resolve is owned by the external tech model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TechFlags {
    /// Farmland upgrade on already-irrigated tiles
    pub farmland: bool,
    /// Railroad construction
    pub railroad: bool,
    /// Roads across river tiles
    pub bridge: bool,
    /// Open-ocean navigation; gates off-continent founding wants
    pub navigation: bool,
}

/// One participant in the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Automation enabled: settlers of this player are driven by the engine
    pub ai_control: bool,
    /// Expansion aggressiveness percentage; 100 = neutral
    pub expand: i32,
    /// Hazard pressure recomputed each turn from global warming counters;
    /// feeds the cleanup-activity bonuses
    pub hazard_pressure: i32,
    pub tech: TechFlags,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ai_control: true,
            expand: 100,
            hazard_pressure: 0,
            tech: TechFlags::default(),
        }
    }

    pub fn with_expand(mut self, expand: i32) -> Self {
        self.expand = expand;
        self
    }
}
