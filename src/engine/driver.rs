//! Per-turn driver
//!
//! Rebuilds the shared grids once, then runs every player's settler pass in
//! a shuffled but seed-deterministic order. Ordering is part of the
//! semantics: the claim grid is mutated as each unit decides, so an earlier
//! unit's choice must be visible to every later one.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::types::{CityId, PlayerId, Pos, UnitId};
use crate::engine::desirability::SiteGrid;
use crate::engine::goals::{self, FERRY_REQUESTED};
use crate::engine::improvements;
use crate::engine::territory::{rebuild_grids, ClaimGrid, TerritoryGrid};
use crate::game::state::GameState;
use crate::game::unit::{Activity, UnitKind, UnitRole};

/// The session-scoped grids the engine reads and writes each turn
#[derive(Debug, Clone)]
pub struct EngineGrids {
    pub site: SiteGrid,
    pub territory: TerritoryGrid,
    pub claims: ClaimGrid,
}

impl EngineGrids {
    pub fn new(state: &GameState) -> Self {
        Self {
            site: SiteGrid::new(state),
            territory: TerritoryGrid::new(state),
            claims: ClaimGrid::new(state),
        }
    }
}

/// Player order for one turn: shuffled, but fully determined by the seed
/// and the turn counter
pub fn shuffled_order(state: &GameState, seed: u64) -> Vec<PlayerId> {
    let mut order: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(u64::from(state.turn)));
    order.shuffle(&mut rng);
    order
}

/// Run the whole settler pass for one turn
pub fn run_turn(state: &mut GameState, grids: &mut EngineGrids, seed: u64) {
    let order = shuffled_order(state, seed);
    grids.site.generate(state);
    // the wholesale rebuild dropped the overlays of founding goals committed
    // on earlier turns; restore them so every later lift has a match
    let pending: Vec<Pos> = state
        .units()
        .filter(|unit| unit.role == UnitRole::FoundCity)
        .map(|unit| unit.travel_target.unwrap_or(unit.pos))
        .collect();
    for goal in pending {
        grids.site.add_pending(goal.x, goal.y);
    }
    rebuild_grids(&mut grids.territory, &mut grids.claims, state, &order);
    for &player in &order {
        run_player_pass(state, grids, player);
    }
}

/// One player's pass: refresh caches, update hazard pressure, then decide
/// every automated settler that is (or can be woken) idle
pub fn run_player_pass(state: &mut GameState, grids: &mut EngineGrids, player: PlayerId) {
    let city_ids: Vec<CityId> = state.cities_of(player).map(|city| city.id).collect();
    for &id in &city_ids {
        improvements::refresh(state, id);
    }
    let pressure = hazard_pressure(state, player);
    state.player_mut(player).hazard_pressure = pressure;

    let unit_ids: Vec<UnitId> = state
        .units_of(player)
        .filter(|unit| unit.auto && unit.is_settler())
        .map(|unit| unit.id)
        .collect();
    let mut decided = 0usize;
    for id in unit_ids {
        let awake = match state.unit_mut(id) {
            Some(unit) => {
                if unit.activity == Activity::Sentry {
                    unit.activity = Activity::Idle;
                }
                // mid-travel units with moves left re-decide; the pending
                // destination stays so a stale founding overlay can be lifted
                if unit.activity == Activity::Travel && unit.moves_left > 0 {
                    unit.activity = Activity::Idle;
                }
                unit.activity == Activity::Idle
            }
            None => false,
        };
        if awake {
            goals::find_work(
                state,
                &mut grids.site,
                &grids.territory,
                &mut grids.claims,
                id,
            );
            decided += 1;
        }
    }
    tracing::info!(
        player = player.0,
        settlers = decided,
        pressure,
        "settler pass complete"
    );
}

/// Write a settlement's settler/founder want values from virtual probes
///
/// A settlement with a settler already waiting on a ferry it must build gets
/// a strongly negative want so the production planner does not stack more
/// settlers behind the same missing boat.
pub fn probe_city_wants(state: &mut GameState, grids: &mut EngineGrids, city_id: CityId) {
    let Some(city) = state.city(city_id) else {
        return;
    };
    let owner = city.owner;
    let probe = goals::probe_want(
        state,
        &mut grids.site,
        &grids.territory,
        &grids.claims,
        city_id,
        UnitKind::Settlers,
    );
    let reserved = state
        .units_of(owner)
        .any(|unit| unit.home_city == Some(city_id) && unit.ferry == Some(FERRY_REQUESTED));
    let want = if reserved { -199 } else { probe.want };
    if let Some(city) = state.city_mut(city_id) {
        city.settler_want = want;
        city.founder_want = want;
        city.ferry_want = probe.ferry_want;
    }
    tracing::debug!(
        city = city_id.0,
        want,
        ferry_want = probe.ferry_want,
        "settlement wants probed"
    );
}

/// Threat-of-warming scalar feeding the hazard-cleanup bonuses
fn hazard_pressure(state: &GameState, player: PlayerId) -> i32 {
    let area = state.map.area().max(1);
    let land_percent = ((state.map.land_tiles() as i32 * 100) / area).max(1);
    state.config.warming_factor * state.citizens(player) * 10
        * (state.global_warming + state.heating)
        / (area * land_percent * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::Pos;
    use crate::game::unit::UnitKind;
    use crate::map::grid::GameMap;
    use crate::map::terrain::Terrain;

    fn open_state() -> (GameState, PlayerId) {
        let mut map = GameMap::filled(30, 30, Terrain::Grassland);
        map.assign_continents();
        let mut state = GameState::new(map, EngineConfig::default());
        let player = state.add_player("alpha");
        (state, player)
    }

    #[test]
    fn test_shuffled_order_is_seed_deterministic() {
        let (mut state, _) = open_state();
        state.add_player("beta");
        state.add_player("gamma");
        let a = shuffled_order(&state, 42);
        let b = shuffled_order(&state, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        // a different turn reshuffles
        state.turn = 7;
        let c = shuffled_order(&state, 42);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_run_turn_founds_with_idle_auto_settler() {
        let (mut state, player) = open_state();
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        state.unit_mut(settler).unwrap().auto = true;
        let mut grids = EngineGrids::new(&state);

        run_turn(&mut state, &mut grids, 1);
        // open grassland everywhere: the settler founds on the spot
        assert_eq!(state.cities().count(), 1);
        assert!(state.unit(settler).is_none());
    }

    #[test]
    fn test_sentried_settler_is_woken() {
        let (mut state, player) = open_state();
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        {
            let unit = state.unit_mut(settler).unwrap();
            unit.auto = true;
            unit.activity = Activity::Sentry;
        }
        let mut grids = EngineGrids::new(&state);
        run_turn(&mut state, &mut grids, 1);
        assert_eq!(state.cities().count(), 1);
    }

    #[test]
    fn test_manual_settler_left_alone() {
        let (mut state, player) = open_state();
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        let mut grids = EngineGrids::new(&state);
        run_turn(&mut state, &mut grids, 1);
        let unit = state.unit(settler).unwrap();
        assert_eq!(unit.activity, Activity::Idle);
        assert_eq!(state.cities().count(), 0);
    }

    #[test]
    fn test_hazard_pressure_scales_with_warming() {
        let (mut state, player) = open_state();
        let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        state.found_city(founder).unwrap();
        state.global_warming = 0;
        let mut grids = EngineGrids::new(&state);
        run_player_pass(&mut state, &mut grids, player);
        assert_eq!(state.player(player).hazard_pressure, 0);

        state.global_warming = 600;
        run_player_pass(&mut state, &mut grids, player);
        assert!(state.player(player).hazard_pressure > 0);
    }

    #[test]
    fn test_probe_city_wants_written_back() {
        let (mut state, player) = open_state();
        let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        let city_id = state.found_city(founder).unwrap();
        let mut grids = EngineGrids::new(&state);
        let order = vec![player];
        grids.site.generate(&state);
        rebuild_grids(&mut grids.territory, &mut grids.claims, &state, &order);
        improvements::refresh(&mut state, city_id);

        probe_city_wants(&mut state, &mut grids, city_id);
        let city = state.city(city_id).unwrap();
        assert!(city.settler_want != 0);
        assert_eq!(city.founder_want, city.settler_want);
    }

    #[test]
    fn test_ferry_reservation_forces_negative_want() {
        let (mut state, player) = open_state();
        let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(15, 15));
        let city_id = state.found_city(founder).unwrap();
        let waiting = state.spawn_unit(player, UnitKind::Settlers, Pos::new(16, 15));
        {
            let unit = state.unit_mut(waiting).unwrap();
            unit.home_city = Some(city_id);
            unit.ferry = Some(FERRY_REQUESTED);
        }
        let mut grids = EngineGrids::new(&state);
        grids.site.generate(&state);
        rebuild_grids(&mut grids.territory, &mut grids.claims, &state, &[player]);
        improvements::refresh(&mut state, city_id);

        probe_city_wants(&mut state, &mut grids, city_id);
        assert_eq!(state.city(city_id).unwrap().settler_want, -199);
    }
}
