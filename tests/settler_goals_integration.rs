//! Integration tests for settler goal selection
//!
//! These tests drive the full decision pipeline the way the turn driver
//! does: rebuild grids, refresh improvement caches, then let real units
//! pick and commit goals. They cover:
//! - The travel-then-improve path (a worked settlement with one standout tile)
//! - Duplicate-effort prevention through the claim grid
//! - Founding competition between settlers of one player
//! - Automation shutdown when no viable work exists

use homestead::core::config::EngineConfig;
use homestead::core::types::{CityId, PlayerId, Pos};
use homestead::engine::driver::EngineGrids;
use homestead::engine::goals::find_work;
use homestead::engine::improvements;
use homestead::engine::territory::rebuild_grids;
use homestead::game::state::GameState;
use homestead::game::unit::{Activity, UnitKind, UnitRole};
use homestead::map::grid::GameMap;
use homestead::map::terrain::Terrain;

fn open_state(size: i32) -> (GameState, PlayerId) {
    let mut map = GameMap::filled(size, size, Terrain::Grassland);
    map.assign_continents();
    let mut state = GameState::new(map, EngineConfig::default());
    let player = state.add_player("alpha");
    (state, player)
}

/// Grid rebuild + cache refresh, the way the driver prepares a pass
fn prepare(state: &mut GameState, grids: &mut EngineGrids) {
    let order: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
    grids.site.generate(state);
    rebuild_grids(&mut grids.territory, &mut grids.claims, state, &order);
    let city_ids: Vec<CityId> = state.cities().map(|c| c.id).collect();
    for id in city_ids {
        improvements::refresh(state, id);
    }
}

// ============================================================================
// Improvement goals
// ============================================================================

/// A settlement with a single minable hill nearby: the settler must commit
/// "travel to the hill, then mine", and the claim grid must show the hill
/// claimed afterwards.
#[test]
fn test_settler_commits_hill_mine_goal() {
    let (mut state, player) = open_state(24);
    let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(10, 10));
    state.found_city(founder).unwrap();
    state.map.set_terrain(11, 10, Terrain::Hills);
    state.map.assign_continents();

    let worker = state.spawn_unit(player, UnitKind::Engineers, Pos::new(12, 12));
    state.unit_mut(worker).unwrap().auto = true;
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    let score = find_work(
        &mut state,
        &mut grids.site,
        &grids.territory,
        &mut grids.claims,
        worker,
    );
    assert!(score > 0, "mine goal must carry a positive want");

    let unit = state.unit(worker).unwrap();
    assert_eq!(unit.role, UnitRole::AutoImprove);
    assert_eq!(unit.activity, Activity::Travel);
    assert_eq!(unit.travel_target, Some(Pos::new(11, 10)));

    // a later unit of the same player sees the claim
    let other = state.spawn_unit(player, UnitKind::Engineers, Pos::new(13, 13));
    let other = state.unit(other).unwrap().clone();
    assert!(grids.claims.is_claimed(&state, &other, 11, 10));
}

/// The chosen activity starts immediately when the settler already stands
/// on the goal cell with moves to spare.
#[test]
fn test_in_place_goal_starts_activity() {
    let (mut state, player) = open_state(24);
    let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(10, 10));
    state.found_city(founder).unwrap();
    state.map.set_terrain(11, 10, Terrain::Hills);
    state.map.assign_continents();

    let worker = state.spawn_unit(player, UnitKind::Engineers, Pos::new(11, 10));
    state.unit_mut(worker).unwrap().auto = true;
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    find_work(
        &mut state,
        &mut grids.site,
        &grids.territory,
        &mut grids.claims,
        worker,
    );
    assert_eq!(state.unit(worker).unwrap().activity, Activity::Mine);
}

/// Two settlers one cell apart, processed sequentially: only one founds at
/// the contested spot, the other finds different work or gives up.
#[test]
fn test_sequential_founders_never_share_a_site() {
    let (mut state, player) = open_state(40);
    let first = state.spawn_unit(player, UnitKind::Settlers, Pos::new(20, 20));
    let second = state.spawn_unit(player, UnitKind::Settlers, Pos::new(21, 20));
    state.unit_mut(first).unwrap().auto = true;
    state.unit_mut(second).unwrap().auto = true;
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    find_work(&mut state, &mut grids.site, &grids.territory, &mut grids.claims, first);
    find_work(&mut state, &mut grids.site, &grids.territory, &mut grids.claims, second);

    assert_eq!(state.cities().count(), 1);
    assert!(state.unit(first).is_none(), "first settler founds and is consumed");
    let city_pos = state.cities().next().unwrap().pos;

    let survivor = state.unit(second).unwrap();
    if survivor.role == UnitRole::FoundCity {
        let target = survivor.travel_target.unwrap_or(survivor.pos);
        assert_ne!(target, city_pos);
    }
}

/// After a full pass no two real units of one player hold the same
/// committed destination.
#[test]
fn test_claim_exclusivity_across_a_pass() {
    let (mut state, player) = open_state(40);
    let mut ids = Vec::new();
    for x in [8, 14, 26, 32] {
        let id = state.spawn_unit(player, UnitKind::Settlers, Pos::new(x, 20));
        state.unit_mut(id).unwrap().auto = true;
        ids.push(id);
    }
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    for id in &ids {
        find_work(&mut state, &mut grids.site, &grids.territory, &mut grids.claims, *id);
    }

    let mut destinations = Vec::new();
    for unit in state.units() {
        if let Some(dest) = unit.travel_target {
            assert!(
                !destinations.contains(&dest),
                "two units converge on {dest:?}"
            );
            destinations.push(dest);
        }
    }
}

/// A settler stranded where nothing can be improved or founded drops out
/// of automation instead of spinning forever.
#[test]
fn test_stranded_settler_disables_automation() {
    let mut map = GameMap::filled(10, 10, Terrain::Ocean);
    map.set_terrain(5, 5, Terrain::Glacier);
    map.assign_continents();
    let mut state = GameState::new(map, EngineConfig::default());
    let player = state.add_player("alpha");
    let lost = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
    state.unit_mut(lost).unwrap().auto = true;
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    let score = find_work(
        &mut state,
        &mut grids.site,
        &grids.territory,
        &mut grids.claims,
        lost,
    );
    assert_eq!(score, 0);
    assert!(!state.unit(lost).unwrap().auto);
}

/// A settler destroyed by its first travel leg (fatal destination) aborts
/// the rest of its evaluation without touching anything else.
#[test]
fn test_destroyed_settler_aborts_cleanly() {
    let (mut state, player) = open_state(24);
    let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(10, 10));
    state.found_city(founder).unwrap();
    state.map.set_terrain(11, 10, Terrain::Hills);
    state.map.assign_continents();

    let worker = state.spawn_unit(player, UnitKind::Engineers, Pos::new(12, 12));
    state.unit_mut(worker).unwrap().auto = true;
    let mut grids = EngineGrids::new(&state);
    prepare(&mut state, &mut grids);

    find_work(
        &mut state,
        &mut grids.site,
        &grids.territory,
        &mut grids.claims,
        worker,
    );
    // the external travel engine finishes the order onto a fatal tile
    state.fatal_tiles.insert((11, 10));
    assert!(!state.complete_travel(worker));
    assert!(state.unit(worker).is_none());
}
