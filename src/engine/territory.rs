//! Territory and claim grids
//!
//! Both grids are rebuilt from scratch once per turn, before any goal
//! selection runs. Territory keeps settlers out of land dominated by
//! somebody else's military; claims keep two units from converging on the
//! same target cell within a pass.

use crate::core::types::PlayerId;
use crate::game::state::GameState;
use crate::game::unit::Unit;
use crate::map::grid::CellGrid;

/// Claim-grid sentinel: cell is off limits to every player
pub const CLAIMED_BY_ALL: u32 = u32::MAX;

/// Per-cell bitmask of which player's military presence dominates the cell
///
/// Stamping is last-writer-wins across players (the stamp ANDs the cell down
/// to the stamping player's bit). That is a deliberate approximation the
/// scoring constants were tuned against; do not replace it with a real
/// influence computation.
#[derive(Debug, Clone)]
pub struct TerritoryGrid {
    cells: CellGrid<u32>,
}

impl TerritoryGrid {
    pub fn new(state: &GameState) -> Self {
        Self {
            cells: CellGrid::matching(&state.map),
        }
    }

    /// Rebuild from current unit and settlement positions, players stamped
    /// in the given order
    pub fn rebuild(&mut self, state: &GameState, order: &[PlayerId]) {
        self.cells.fill(CLAIMED_BY_ALL);
        for &player in order {
            for unit in state.units_of(player) {
                if !unit.is_combat() {
                    continue;
                }
                let spec = unit.kind.spec();
                if unit.is_sailing() {
                    let distance = 1 + (unit.move_rate() / 3) as i32;
                    self.stamp(state, unit.pos.x, unit.pos.y, player, distance, true);
                } else {
                    let divisor = if spec.ignores_terrain { 1 } else { 3 };
                    let distance = 1 + (unit.move_rate() / divisor) as i32;
                    self.stamp(state, unit.pos.x, unit.pos.y, player, distance, false);
                }
            }
            for city in state.cities_of(player) {
                self.stamp(state, city.pos.x, city.pos.y, player, 3, false);
            }
        }
    }

    /// Stamp a square region with the player's presence. Ships only reach
    /// cells touching water.
    fn stamp(
        &mut self,
        state: &GameState,
        x: i32,
        y: i32,
        player: PlayerId,
        distance: i32,
        coastal_only: bool,
    ) {
        for j in y - distance..=y + distance {
            for i in x - distance..=x + distance {
                if coastal_only && !state.map.is_water_adjacent(i, j) {
                    continue;
                }
                self.cells.update(i, j, |mask| mask & player.bit());
            }
        }
    }

    /// True if the player's presence bit survives at the cell
    pub fn holds(&self, player: PlayerId, x: i32, y: i32) -> bool {
        self.cells.get(x, y) & player.bit() != 0
    }

    /// A cell is threatened for a player when somebody else stamped it last
    pub fn is_threatened(&self, player: PlayerId, x: i32, y: i32) -> bool {
        !self.holds(player, x, y)
    }
}

/// Per-cell bitmask of players that already target or occupy the cell
#[derive(Debug, Clone)]
pub struct ClaimGrid {
    cells: CellGrid<u32>,
}

impl ClaimGrid {
    pub fn new(state: &GameState) -> Self {
        Self {
            cells: CellGrid::matching(&state.map),
        }
    }

    /// Rebuild from current orders: travel destinations are claimed for the
    /// owner, stationary settlers block everyone, and foreign military
    /// blocks everyone but its owner
    pub fn rebuild(&mut self, state: &GameState, order: &[PlayerId]) {
        self.cells.fill(0);
        for &player in order {
            let bit = player.bit();
            for unit in state.units_of(player) {
                if unit.is_settler() {
                    if let Some(dest) = unit.travel_target {
                        self.cells.update(dest.x, dest.y, |mask| mask | bit);
                    } else {
                        self.cells.set(unit.pos.x, unit.pos.y, CLAIMED_BY_ALL);
                    }
                } else {
                    self.cells
                        .update(unit.pos.x, unit.pos.y, |mask| mask | (CLAIMED_BY_ALL ^ bit));
                }
            }
        }
    }

    /// Record a freshly decided goal so later units in the same pass see it
    pub fn claim(&mut self, player: PlayerId, x: i32, y: i32) {
        self.cells.update(x, y, |mask| mask | player.bit());
    }

    /// Whether targeting `(x, y)` would double-book the cell for this unit
    ///
    /// The unit's own cell and its own travel destination do not conflict,
    /// unless a foreign unit or a rival settler already stands there.
    pub fn is_claimed(&self, state: &GameState, unit: &Unit, x: i32, y: i32) -> bool {
        let Some(pos) = state.map.normalize(x, y) else {
            // off-map is never a legal target; treat as claimed
            return true;
        };
        if unit.pos == pos || unit.travel_target == Some(pos) {
            for other in state.units_at(pos.x, pos.y) {
                if other.id == unit.id {
                    continue;
                }
                if other.owner != unit.owner {
                    return true;
                }
                if other.is_settler() && unit.is_settler() {
                    return true;
                }
            }
            return false;
        }
        self.cells.get(pos.x, pos.y) & unit.owner.bit() != 0
    }
}

/// Clears both grids' per-turn state and restamps them in player order
pub fn rebuild_grids(
    territory: &mut TerritoryGrid,
    claims: &mut ClaimGrid,
    state: &GameState,
    order: &[PlayerId],
) {
    claims.rebuild(state, order);
    territory.rebuild(state, order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::Pos;
    use crate::game::unit::UnitKind;
    use crate::map::grid::GameMap;
    use crate::map::terrain::Terrain;

    fn state_with_players(n: usize) -> (GameState, Vec<PlayerId>) {
        let mut map = GameMap::filled(16, 16, Terrain::Grassland);
        map.assign_continents();
        let mut state = GameState::new(map, EngineConfig::default());
        let players = (0..n)
            .map(|i| state.add_player(format!("p{i}")))
            .collect();
        (state, players)
    }

    #[test]
    fn test_unstamped_cells_belong_to_everyone() {
        let (state, players) = state_with_players(2);
        let mut territory = TerritoryGrid::new(&state);
        territory.rebuild(&state, &players);
        assert!(territory.holds(players[0], 3, 3));
        assert!(territory.holds(players[1], 3, 3));
    }

    #[test]
    fn test_contested_stamps_threaten_everyone() {
        let (mut state, players) = state_with_players(2);
        state.spawn_unit(players[0], UnitKind::Militia, Pos::new(5, 5));
        state.spawn_unit(players[1], UnitKind::Militia, Pos::new(6, 5));
        let mut territory = TerritoryGrid::new(&state);
        territory.rebuild(&state, &players);
        // the AND stamp leaves contested cells with no surviving bit; that
        // approximation is load-bearing for the tuned scoring constants
        assert!(territory.is_threatened(players[0], 5, 5));
        assert!(territory.is_threatened(players[1], 5, 5));
        // cells only player 1 reaches stay theirs
        assert!(territory.holds(players[1], 8, 5));
        assert!(territory.is_threatened(players[0], 8, 5));
    }

    #[test]
    fn test_stationary_settler_blocks_everyone() {
        let (mut state, players) = state_with_players(2);
        let settler = state.spawn_unit(players[0], UnitKind::Settlers, Pos::new(4, 4));
        let mut claims = ClaimGrid::new(&state);
        claims.rebuild(&state, &players);
        let rival = state.spawn_unit(players[1], UnitKind::Settlers, Pos::new(8, 8));
        let rival = state.unit(rival).unwrap();
        assert!(claims.is_claimed(&state, rival, 4, 4));
        // the settler itself is not in conflict with its own cell
        let own = state.unit(settler).unwrap();
        assert!(!claims.is_claimed(&state, own, 4, 4));
    }

    #[test]
    fn test_travel_destination_claimed_for_owner_only() {
        let (mut state, players) = state_with_players(2);
        let traveler = state.spawn_unit(players[0], UnitKind::Settlers, Pos::new(2, 2));
        state.order_travel(traveler, 9, 9);
        let mut claims = ClaimGrid::new(&state);
        claims.rebuild(&state, &players);

        let own_other = state.spawn_unit(players[0], UnitKind::Settlers, Pos::new(3, 3));
        let own_other = state.unit(own_other).unwrap().clone();
        assert!(claims.is_claimed(&state, &own_other, 9, 9));

        let foreign = state.spawn_unit(players[1], UnitKind::Settlers, Pos::new(3, 4));
        let foreign = state.unit(foreign).unwrap().clone();
        assert!(!claims.is_claimed(&state, &foreign, 9, 9));
    }

    #[test]
    fn test_claim_commits_for_later_units() {
        let (mut state, players) = state_with_players(1);
        let mut claims = ClaimGrid::new(&state);
        claims.rebuild(&state, &players);
        claims.claim(players[0], 7, 7);
        let unit = state.spawn_unit(players[0], UnitKind::Settlers, Pos::new(1, 1));
        let unit = state.unit(unit).unwrap();
        assert!(claims.is_claimed(&state, unit, 7, 7));
    }
}
