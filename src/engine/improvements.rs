//! Per-settlement improvement cache
//!
//! For every workable offset of a settlement, seven probes ask "what would
//! this tile be worth if the improvement were already done". Each probe
//! values a hypothetical copy of the tile (`City::tile_value_with`); shared
//! map state is never touched. The probes are nonlinear in several tile
//! attributes at once, so the cache is only ever recomputed wholesale.

use crate::core::types::CityId;
use crate::game::city::{work_offsets, CacheGrid, City, ImprovementCache, NOT_APPLICABLE};
use crate::game::state::GameState;
use crate::game::unit::Activity;
use crate::map::terrain::Terrain;
use crate::map::tile::Features;

/// The seven cached improvement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovementKind {
    Irrigate,
    Transform,
    Mine,
    Road,
    Railroad,
    CleanPollution,
    CleanFallout,
}

impl ImprovementKind {
    /// The unit activity that carries out this improvement
    pub fn activity(&self) -> Activity {
        match self {
            ImprovementKind::Irrigate => Activity::Irrigate,
            ImprovementKind::Transform => Activity::Transform,
            ImprovementKind::Mine => Activity::Mine,
            ImprovementKind::Road => Activity::Road,
            ImprovementKind::Railroad => Activity::Railroad,
            ImprovementKind::CleanPollution => Activity::CleanPollution,
            ImprovementKind::CleanFallout => Activity::CleanFallout,
        }
    }
}

/// Cached values for one kind over a settlement's workable grid
pub fn cache_grid<'a>(cache: &'a ImprovementCache, kind: ImprovementKind) -> &'a CacheGrid {
    match kind {
        ImprovementKind::Irrigate => &cache.irrigate,
        ImprovementKind::Transform => &cache.transform,
        ImprovementKind::Mine => &cache.mine,
        ImprovementKind::Road => &cache.road,
        ImprovementKind::Railroad => &cache.railroad,
        ImprovementKind::CleanPollution => &cache.clean_pollution,
        ImprovementKind::CleanFallout => &cache.clean_fallout,
    }
}

/// Recompute a settlement's whole improvement cache
///
/// Must be called whenever any cell in the settlement's radius changes
/// terrain or features: at the start of each turn pass, after a neighboring
/// settlement is founded, and after any improvement completes.
pub fn refresh(state: &mut GameState, city_id: CityId) {
    let Some(city) = state.city(city_id).cloned() else {
        return;
    };
    let best = state.best_worker_tile_value(&city);

    let mut cache = ImprovementCache::default();
    for (i, j) in work_offsets() {
        cache.irrigate[i][j] = calc_irrigate(state, &city, i, j);
        cache.transform[i][j] = calc_transform(state, &city, i, j);
        cache.mine[i][j] = calc_mine(state, &city, i, j);
        cache.road[i][j] = calc_road(state, &city, i, j);
        cache.railroad[i][j] = calc_railroad(state, &city, i, j);
        cache.clean_pollution[i][j] = calc_pollution(state, &city, i, j, best);
        cache.clean_fallout[i][j] = calc_fallout(state, &city, i, j, best);
    }

    if let Some(city) = state.city_mut(city_id) {
        city.cache = cache;
    }
    tracing::debug!(city = city_id.0, "improvement cache refreshed");
}

/// Wet adjacency needed for irrigation: the tile itself or an orthogonal
/// neighbor carries water
fn wet_adjacent(state: &GameState, x: i32, y: i32) -> bool {
    [(0, 0), (0, -1), (0, 1), (-1, 0), (1, 0)]
        .iter()
        .any(|&(dx, dy)| {
            state
                .map
                .tile(x + dx, y + dy)
                .map_or(false, |tile| tile.is_wet())
        })
}

fn calc_irrigate(state: &GameState, city: &City, i: usize, j: usize) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    let spec = tile.terrain.spec();
    let tech = state.player(city.owner).tech;

    match spec.irrigation_result {
        Some(result) if result != tile.terrain => {
            // irrigating converts the terrain outright (forest, swamp...)
            let probe = tile.overridden(result, tile.features.without(Features::MINE));
            state.city_tile_value_with(city, probe)
        }
        Some(_) => {
            let features = tile.features;
            let blocked = features.has(Features::MINE) || state.city_at(x, y).is_some();
            if blocked || !wet_adjacent(state, x, y) {
                return NOT_APPLICABLE;
            }
            if !features.has(Features::IRRIGATION) {
                let probe = tile.overridden(tile.terrain, features.with(Features::IRRIGATION));
                state.city_tile_value_with(city, probe)
            } else if !features.has(Features::FARMLAND) && tech.farmland {
                let probe = tile.overridden(tile.terrain, features.with(Features::FARMLAND));
                state.city_tile_value_with(city, probe)
            } else {
                NOT_APPLICABLE
            }
        }
        None => NOT_APPLICABLE,
    }
}

fn calc_mine(state: &GameState, city: &City, i: usize, j: usize) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    let minable = matches!(tile.terrain, Terrain::Hills | Terrain::Mountains);
    if !minable
        || tile.features.has(Features::IRRIGATION)
        || tile.features.has(Features::MINE)
    {
        return NOT_APPLICABLE;
    }
    let probe = tile.overridden(tile.terrain, tile.features.with(Features::MINE));
    state.city_tile_value_with(city, probe)
}

fn calc_transform(state: &GameState, city: &City, i: usize, j: usize) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    if !tile.terrain.can_transform() {
        return NOT_APPLICABLE;
    }
    let Some(result) = tile.terrain.spec().transform_result else {
        return NOT_APPLICABLE;
    };
    if result.is_water() && state.city_at(x, y).is_some() {
        // never transform a settlement into the ocean
        return NOT_APPLICABLE;
    }

    let mut features = tile.features;
    if !matches!(result, Terrain::Hills | Terrain::Mountains) {
        features.clear(Features::MINE);
    }
    if result.spec().irrigation_result != Some(result) {
        features.clear(Features::IRRIGATION);
        features.clear(Features::FARMLAND);
    }
    let probe = tile.overridden(result, features);
    state.city_tile_value_with(city, probe)
}

fn calc_road(state: &GameState, city: &City, i: usize, j: usize) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    let tech = state.player(city.owner).tech;
    if tile.terrain.is_water()
        || tile.features.has(Features::ROAD)
        || (tile.features.has(Features::RIVER) && !tech.bridge)
    {
        return NOT_APPLICABLE;
    }
    let probe = tile.overridden(tile.terrain, tile.features.with(Features::ROAD));
    state.city_tile_value_with(city, probe)
}

fn calc_railroad(state: &GameState, city: &City, i: usize, j: usize) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    let tech = state.player(city.owner).tech;
    if tile.terrain.is_water() || !tech.railroad || tile.features.has(Features::RAILROAD) {
        return NOT_APPLICABLE;
    }
    let probe = tile.overridden(
        tile.terrain,
        tile.features.with(Features::ROAD).with(Features::RAILROAD),
    );
    state.city_tile_value_with(city, probe)
}

fn calc_pollution(state: &GameState, city: &City, i: usize, j: usize, best: i32) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    if !tile.features.has(Features::POLLUTION) {
        return NOT_APPLICABLE;
    }
    let probe = tile.overridden(tile.terrain, tile.features.without(Features::POLLUTION));
    let cleaned = state.city_tile_value_with(city, probe);
    // urgency shaping: cleanup competes with the best tile already worked
    (cleaned + best + 50) * 2
}

fn calc_fallout(state: &GameState, city: &City, i: usize, j: usize, best: i32) -> i32 {
    let (x, y) = city.offset_pos(i, j);
    let Some(tile) = state.map.tile(x, y).copied() else {
        return NOT_APPLICABLE;
    };
    if !tile.features.has(Features::FALLOUT) {
        return NOT_APPLICABLE;
    }
    let probe = tile.overridden(tile.terrain, tile.features.without(Features::FALLOUT));
    let cleaned = state.city_tile_value_with(city, probe);
    if !state.player(city.owner).ai_control {
        (cleaned + best + 50) * 2
    } else {
        cleaned
    }
}
