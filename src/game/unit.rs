//! Mobile units: kinds, activities, travel orders

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, PlayerId, Pos, UnitId};

/// Move points consumed by one tile of open ground
pub const MOVE_POINTS_PER_TILE: u32 = 3;

/// Unit kinds known to the settler engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Founds settlements and performs basic improvements
    Settlers,
    /// Improvement specialist: can also transform terrain, but cannot found
    Engineers,
    /// Combat unit; exists here only to project territory
    Militia,
    /// Sea transport for carrying land units across water
    Transport,
}

/// Static per-kind attributes
#[derive(Debug, Clone, Copy)]
pub struct UnitTypeSpec {
    pub name: &'static str,
    /// Tiles per turn on open ground
    pub move_tiles: u32,
    pub attack: u32,
    /// Can perform terrain improvements
    pub settler: bool,
    /// Can found settlements
    pub founder: bool,
    /// Can perform heavy terrain transformation
    pub transformer: bool,
    pub sailing: bool,
    /// Land units carried at once (transports only)
    pub transport_capacity: u32,
    /// Terrain movement costs ignored (fast skirmishers)
    pub ignores_terrain: bool,
    /// Food drawn from the home settlement each turn
    pub food_upkeep: i32,
}

impl UnitKind {
    pub fn spec(&self) -> &'static UnitTypeSpec {
        match self {
            UnitKind::Settlers => &UnitTypeSpec {
                name: "settlers",
                move_tiles: 1,
                attack: 0,
                settler: true,
                founder: true,
                transformer: false,
                sailing: false,
                transport_capacity: 0,
                ignores_terrain: false,
                food_upkeep: 1,
            },
            UnitKind::Engineers => &UnitTypeSpec {
                name: "engineers",
                move_tiles: 2,
                attack: 0,
                settler: true,
                founder: false,
                transformer: true,
                sailing: false,
                transport_capacity: 0,
                ignores_terrain: false,
                food_upkeep: 1,
            },
            UnitKind::Militia => &UnitTypeSpec {
                name: "militia",
                move_tiles: 1,
                attack: 1,
                settler: false,
                founder: false,
                transformer: false,
                sailing: false,
                transport_capacity: 0,
                ignores_terrain: false,
                food_upkeep: 0,
            },
            UnitKind::Transport => &UnitTypeSpec {
                name: "transport",
                move_tiles: 4,
                attack: 0,
                settler: false,
                founder: false,
                transformer: false,
                sailing: true,
                transport_capacity: 4,
                ignores_terrain: false,
                food_upkeep: 0,
            },
        }
    }

    /// Move allowance in move points per turn
    pub fn move_rate(&self) -> u32 {
        self.spec().move_tiles * MOVE_POINTS_PER_TILE
    }
}

/// What a unit is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Idle,
    Sentry,
    Travel,
    Irrigate,
    Mine,
    Transform,
    Road,
    Railroad,
    CleanPollution,
    CleanFallout,
}

impl Activity {
    pub fn is_improvement(&self) -> bool {
        matches!(
            self,
            Activity::Irrigate
                | Activity::Mine
                | Activity::Transform
                | Activity::Road
                | Activity::Railroad
                | Activity::CleanPollution
                | Activity::CleanFallout
        )
    }
}

/// Pending engine-assigned purpose, persisted across turns of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitRole {
    None,
    /// Travel to the goal tile and begin the chosen improvement
    AutoImprove,
    /// Travel to the goal tile and found a settlement there
    FoundCity,
}

/// A mobile unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: PlayerId,
    pub kind: UnitKind,
    pub pos: Pos,
    /// Move points left this turn
    pub moves_left: u32,
    pub activity: Activity,
    /// Destination of a pending travel order
    pub travel_target: Option<Pos>,
    /// Engine automation flag; cleared when no viable work exists
    pub auto: bool,
    pub role: UnitRole,
    /// Ferry assigned for multi-turn sea transport
    pub ferry: Option<UnitId>,
    /// Passenger aboard (transports only)
    pub passenger: Option<UnitId>,
    /// Home settlement paying this unit's food upkeep
    pub home_city: Option<CityId>,
}

impl Unit {
    pub fn new(id: UnitId, owner: PlayerId, kind: UnitKind, pos: Pos) -> Self {
        Self {
            id,
            owner,
            kind,
            pos,
            moves_left: kind.move_rate(),
            activity: Activity::Idle,
            travel_target: None,
            auto: false,
            role: UnitRole::None,
            ferry: None,
            passenger: None,
            home_city: None,
        }
    }

    pub fn move_rate(&self) -> u32 {
        self.kind.move_rate()
    }

    pub fn is_settler(&self) -> bool {
        self.kind.spec().settler
    }

    pub fn can_found(&self) -> bool {
        self.kind.spec().founder
    }

    pub fn is_combat(&self) -> bool {
        self.kind.spec().attack > 0
    }

    pub fn is_sailing(&self) -> bool {
        self.kind.spec().sailing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_rate_scaling() {
        assert_eq!(UnitKind::Settlers.move_rate(), 3);
        assert_eq!(UnitKind::Transport.move_rate(), 12);
    }

    #[test]
    fn test_engineers_improve_but_do_not_found() {
        let spec = UnitKind::Engineers.spec();
        assert!(spec.settler && spec.transformer);
        assert!(!spec.founder);
    }
}
