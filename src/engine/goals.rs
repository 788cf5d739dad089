//! Settler goal selection
//!
//! One unit at a time: scan every workable offset of the owner's settlements
//! for the best improvement, then (for founder-capable units) a wide
//! neighborhood for the best new-settlement site, and commit the single
//! highest-scoring action as a travel order plus a pending role.
//!
//! The same evaluation path also runs against a detached virtual unit to
//! answer "how much does this settlement want to produce a settler"; that
//! overload commits nothing.

use crate::core::types::{CityId, Pos, UnitId};
use crate::engine::desirability::SiteGrid;
use crate::engine::discount::discount;
use crate::engine::improvements;
use crate::engine::territory::{ClaimGrid, TerritoryGrid};
use crate::engine::travel::{find_ferry, same_continent, TravelCosts, Warmap};
use crate::game::city::{work_offsets, WorkStatus};
use crate::game::state::GameState;
use crate::game::unit::{Activity, Unit, UnitRole};
use crate::map::terrain::Terrain;
use crate::map::tile::Features;

/// Sentinel ferry reference: a ferry was requested but none exists yet.
/// Real unit ids start at 1, so id 0 is free to carry this meaning.
pub const FERRY_REQUESTED: UnitId = UnitId(0);

/// Travel-cost stand-in for targets no route can reach
const NO_ROUTE: i32 = 9999;

/// Clamp an oracle cost into the signed range the scoring math uses
fn capped(cost: u32) -> i32 {
    if cost >= NO_ROUTE as u32 {
        NO_ROUTE
    } else {
        cost as i32
    }
}

/// What the selected goal does on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalAction {
    Improve(Activity),
    Found,
}

/// Outcome of one evaluation pass, before any commit
#[derive(Debug, Clone, Copy)]
struct Evaluation {
    /// Best normalized score across improvements and founding
    score: i32,
    action: GoalAction,
    /// Target cell; `None` with a positive score means the best option is a
    /// founding site no physical route reaches yet
    target: Option<Pos>,
    /// Positive remainder of an off-continent founding want that needs a
    /// ferry built before it can be acted on
    ferry_want: i32,
}

/// Settlement want values produced by the virtual-unit probe
#[derive(Debug, Clone, Copy)]
pub struct CityWant {
    /// Signed want: negative when the only want found is an unreachable
    /// founding site
    pub want: i32,
    pub ferry_want: i32,
}

/// Pick and commit the best action for one real settler
///
/// Returns the committed score (0 when nothing viable was found or the unit
/// died mid-commit). Builds a fresh `Warmap` anchored at the unit.
pub fn find_work(
    state: &mut GameState,
    site: &mut SiteGrid,
    territory: &TerritoryGrid,
    claims: &mut ClaimGrid,
    unit_id: UnitId,
) -> i32 {
    let Some(unit) = state.unit(unit_id).cloned() else {
        return 0;
    };
    let warmap = Warmap::for_unit(state, &unit);
    find_work_with(state, site, territory, claims, &warmap, unit_id)
}

/// `find_work` against a caller-supplied travel-cost oracle
pub fn find_work_with(
    state: &mut GameState,
    site: &mut SiteGrid,
    territory: &TerritoryGrid,
    claims: &mut ClaimGrid,
    costs: &dyn TravelCosts,
    unit_id: UnitId,
) -> i32 {
    let Some(unit) = state.unit(unit_id).cloned() else {
        return 0;
    };

    // a pending founding order from an earlier turn depressed the site grid
    // around its target; lift that before re-deciding. With no travel target
    // left the unit already stands on its goal.
    if unit.role == UnitRole::FoundCity {
        let dest = unit.travel_target.unwrap_or(unit.pos);
        site.remove_pending(dest.x, dest.y);
        if let Some(u) = state.unit_mut(unit_id) {
            u.role = UnitRole::AutoImprove;
        }
    }

    let eval = evaluate(state, site, territory, claims, costs, &unit);

    let Some(goal) = eval.target else {
        // nothing viable anywhere: drop out of automation instead of looping
        tracing::debug!(unit = unit_id.0, "settler has no purpose, automation off");
        if let Some(u) = state.unit_mut(unit_id) {
            u.auto = false;
            u.travel_target = None;
            u.role = UnitRole::None;
        }
        return 0;
    };

    claims.claim(unit.owner, goal.x, goal.y);
    match eval.action {
        GoalAction::Found => {
            if let Some(u) = state.unit_mut(unit_id) {
                u.role = UnitRole::FoundCity;
            }
            site.add_pending(goal.x, goal.y);
        }
        GoalAction::Improve(_) => {
            if let Some(u) = state.unit_mut(unit_id) {
                u.role = UnitRole::AutoImprove;
            }
        }
    }
    tracing::debug!(
        unit = unit_id.0,
        x = goal.x,
        y = goal.y,
        score = eval.score,
        action = ?eval.action,
        "goal committed"
    );

    if goal != unit.pos {
        if !same_continent(state, unit.pos, goal) {
            // ferry leg first
            match find_ferry(state, costs, &unit) {
                Some(ferry_id) => {
                    let ferry_pos = match state.unit(ferry_id) {
                        Some(ferry) => ferry.pos,
                        None => return 0,
                    };
                    if let Some(u) = state.unit_mut(unit_id) {
                        u.ferry = Some(ferry_id);
                    }
                    if ferry_pos != unit.pos {
                        state.order_travel(unit_id, ferry_pos.x, ferry_pos.y);
                        if state.unit(unit_id).is_none() {
                            return 0;
                        }
                        // remember the final goal across the pickup leg
                        if let Some(u) = state.unit_mut(unit_id) {
                            u.travel_target = Some(goal);
                        }
                    } else {
                        board_and_sail(state, unit_id, ferry_id, goal);
                    }
                }
                None => {
                    // no boat afloat; flag the request so production probes
                    // see it
                    if let Some(u) = state.unit_mut(unit_id) {
                        u.ferry = Some(FERRY_REQUESTED);
                    }
                }
            }
        } else if state.unit(unit_id).map_or(false, |u| u.moves_left > 0) {
            state.order_travel(unit_id, goal.x, goal.y);
            if state.unit(unit_id).is_none() {
                return 0;
            }
            if let Some(u) = state.unit_mut(unit_id) {
                u.ferry = None;
            }
        }
    }

    // already standing on the goal: act now
    let arrived = state
        .unit(unit_id)
        .map_or(false, |u| {
            u.auto && u.moves_left > 0 && u.activity == Activity::Idle && u.pos == goal
        });
    if arrived {
        match eval.action {
            GoalAction::Found => {
                site.remove_pending(goal.x, goal.y);
                if let Err(err) = execute_found(state, unit_id) {
                    tracing::debug!(unit = unit_id.0, %err, "founding failed on arrival");
                }
            }
            GoalAction::Improve(activity) => {
                state.set_activity(unit_id, activity);
            }
        }
    }
    eval.score
}

/// Board a co-located ferry and send it toward the goal
fn board_and_sail(state: &mut GameState, unit_id: UnitId, ferry_id: UnitId, goal: Pos) {
    let free = state
        .unit(ferry_id)
        .map_or(false, |f| f.passenger.is_none() || f.passenger == Some(unit_id));
    if !free {
        return;
    }
    if let Some(ferry) = state.unit_mut(ferry_id) {
        ferry.passenger = Some(unit_id);
    }
    if let Some(u) = state.unit_mut(unit_id) {
        u.travel_target = Some(goal);
        u.activity = Activity::Sentry;
    }
    state.order_travel(ferry_id, goal.x, goal.y);
    tracing::debug!(unit = unit_id.0, ferry = ferry_id.0, "aboard ferry");
}

/// Found a settlement at the unit's position and refresh the improvement
/// caches of every friendly settlement in the new radius, so neighbors never
/// keep stale probes like transforming the new settlement into ocean
pub fn execute_found(state: &mut GameState, unit_id: UnitId) -> crate::core::error::Result<CityId> {
    let city_id = state.found_city(unit_id)?;
    let (owner, pos) = {
        let city = state
            .city(city_id)
            .ok_or(crate::core::error::HomesteadError::CityNotFound(city_id))?;
        (city.owner, city.pos)
    };
    let mut to_refresh = vec![city_id];
    for (i, j) in work_offsets() {
        let (x, y) = (pos.x + i as i32 - 2, pos.y + j as i32 - 2);
        if let Some(other) = state.city_at(x, y) {
            if other.owner == owner && other.id != city_id {
                to_refresh.push(other.id);
            }
        }
    }
    for id in to_refresh {
        improvements::refresh(state, id);
    }
    Ok(city_id)
}

/// Settler and founder want of one settlement, probed with a virtual unit
/// that is never registered and commits nothing
pub fn probe_want(
    state: &GameState,
    site: &mut SiteGrid,
    territory: &TerritoryGrid,
    claims: &ClaimGrid,
    city_id: CityId,
    kind: crate::game::unit::UnitKind,
) -> CityWant {
    let Some(city) = state.city(city_id) else {
        return CityWant {
            want: 0,
            ferry_want: 0,
        };
    };
    let virtual_unit = Unit::new(FERRY_REQUESTED, city.owner, kind, city.pos);
    let warmap = Warmap::for_unit(state, &virtual_unit);
    let eval = evaluate(state, site, territory, claims, &warmap, &virtual_unit);
    let want = if eval.target.is_none() {
        -eval.score
    } else {
        eval.score
    };
    CityWant {
        want,
        ferry_want: eval.ferry_want,
    }
}

/// The shared evaluation path behind both the real and virtual overloads
fn evaluate(
    state: &GameState,
    site: &mut SiteGrid,
    territory: &TerritoryGrid,
    claims: &ClaimGrid,
    costs: &dyn TravelCosts,
    unit: &Unit,
) -> Evaluation {
    let config = &state.config;
    let player = state.player(unit.owner);
    let is_virtual = unit.id == FERRY_REQUESTED;
    let home = state.city_at(unit.pos.x, unit.pos.y);
    let ucont = state.map.continent(unit.pos.x, unit.pos.y).unwrap_or(0);
    let mv_rate = unit.move_rate() as i32;

    // production-cost proxy and upkeep, used to normalize raw gains into a
    // comparable want
    let food_cost = if !is_virtual {
        30
    } else {
        let size = home.map_or(1, |city| i32::from(city.size));
        let mut cost = if size <= 1 { 20 } else { 40 * (size - 1) / size };
        if home.map_or(false, |city| city.has_granary) {
            cost -= 20;
        }
        cost
    };
    let mut food_upkeep = unit.kind.spec().food_upkeep;
    if !is_virtual && unit.home_city.is_none() {
        food_upkeep = 0;
    }

    // === improvement scan over the owner's settlements ===
    let mut best = BestAction::new();
    for city in state.cities_of(unit.owner) {
        for (i, j) in work_offsets() {
            let status = city.status(i, j);
            if status == WorkStatus::Unavailable {
                continue;
            }
            let in_use = status == WorkStatus::Worker;
            let (x, y) = city.offset_pos(i, j);
            if state.map.continent(x, y) != Some(ucont) {
                continue;
            }
            let travel = costs.cost(x, y);
            if travel > config.travel_threshold * unit.move_rate() {
                continue;
            }
            if territory.is_threatened(unit.owner, x, y) {
                continue;
            }
            if claims.is_claimed(state, unit, x, y) {
                continue;
            }
            let Some(tile) = state.map.tile(x, y) else {
                continue;
            };
            let spec = tile.terrain.spec();
            let mv_turns = (travel as i32) / mv_rate;
            let oldv = state.city_tile_value(city, i, j);
            let cache = &city.cache;

            let d = (spec.irrigation_time * 3 + mv_rate - 1) / mv_rate + mv_turns;
            best.consider(
                state,
                Activity::Irrigate,
                -1,
                cache.irrigate[i][j],
                oldv,
                in_use,
                d,
                x,
                y,
            );

            if unit.kind.spec().transformer {
                let d = (spec.transform_time * 3 + mv_rate - 1) / mv_rate + mv_turns;
                best.consider(
                    state,
                    Activity::Transform,
                    -1,
                    cache.transform[i][j],
                    oldv,
                    in_use,
                    d,
                    x,
                    y,
                );
            }

            let d = (spec.mining_time * 3 + mv_rate - 1) / mv_rate + mv_turns;
            best.consider(
                state,
                Activity::Mine,
                -1,
                cache.mine[i][j],
                oldv,
                in_use,
                d,
                x,
                y,
            );

            if !tile.features.has(Features::ROAD) {
                let d = (spec.road_time * 3 + 3 + mv_rate - 1) / mv_rate + mv_turns;
                best.consider(
                    state,
                    Activity::Road,
                    road_bonus(state, x, y, Features::ROAD) * config.road_connect_bonus,
                    cache.road[i][j],
                    oldv,
                    in_use,
                    d,
                    x,
                    y,
                );

                // railroad via building the road first
                let d = (3 * 3 + 3 * spec.road_time + 3 + mv_rate - 1) / mv_rate + mv_turns;
                best.consider(
                    state,
                    Activity::Road,
                    road_bonus(state, x, y, Features::RAILROAD) * config.railroad_connect_bonus,
                    cache.railroad[i][j],
                    oldv,
                    in_use,
                    d,
                    x,
                    y,
                );
            } else {
                let d = (3 * 3 + mv_rate - 1) / mv_rate + mv_turns;
                best.consider(
                    state,
                    Activity::Railroad,
                    road_bonus(state, x, y, Features::RAILROAD) * config.railroad_connect_bonus,
                    cache.railroad[i][j],
                    oldv,
                    in_use,
                    d,
                    x,
                    y,
                );
            }

            let d = (3 * 3 + mv_rate - 1) / mv_rate + mv_turns;
            best.consider(
                state,
                Activity::CleanPollution,
                player.hazard_pressure,
                cache.clean_pollution[i][j],
                oldv,
                in_use,
                d,
                x,
                y,
            );
            best.consider(
                state,
                Activity::CleanFallout,
                player.hazard_pressure,
                cache.clean_fallout[i][j],
                oldv,
                in_use,
                d,
                x,
                y,
            );
        }
    }

    let mut best_score =
        ((best.score - food_upkeep * config.food_weighting) * 100 / (40 + food_cost)).max(0);
    let mut action = best
        .target
        .map(|(activity, _)| GoalAction::Improve(activity))
        .unwrap_or(GoalAction::Improve(Activity::Idle));
    let mut target = best.target.map(|(_, pos)| pos);
    if best_score == 0 {
        target = None;
    }

    // === founder scan ===
    let mut ferry_choice = 0;
    if unit.can_found() && player.ai_control {
        let ferry = find_ferry(state, costs, unit);
        let ferry_aboard = ferry
            .and_then(|id| state.unit(id))
            .filter(|boat| boat.pos == unit.pos);
        // an outstanding boat request homed here counts as a boat the
        // settlement has yet to launch
        let ferry_requested = home.map_or(false, |city| {
            state
                .units_of(unit.owner)
                .any(|u| u.home_city == Some(city.id) && u.ferry == Some(FERRY_REQUESTED))
        });
        let radius = config.founder_scan_radius;

        for j in -radius..=radius {
            for i in -radius..=radius {
                let (x, y) = (unit.pos.x + i, unit.pos.y + j);
                let Some(pos) = state.map.normalize(x, y) else {
                    continue;
                };
                let near = i.abs().max(j.abs());
                let site_cont = state.map.continent(pos.x, pos.y).unwrap_or(0);

                if claims.is_claimed(state, unit, pos.x, pos.y)
                    || state
                        .map
                        .terrain(pos.x, pos.y)
                        .map_or(true, |terrain| terrain.is_water())
                    || territory.is_threatened(unit.owner, pos.x, pos.y)
                    || (near >= config.founder_near_limit && site_cont == ucont)
                    || !state.can_found_at(pos.x, pos.y)
                    || state.city_exists_within_radius(pos.x, pos.y)
                {
                    continue;
                }

                let mut w_virtual = false;
                let mv_cost = if let Some(boat) = ferry_aboard {
                    if !state.map.is_water_adjacent(pos.x, pos.y) {
                        NO_ROUTE
                    } else {
                        capped(costs.sea_cost(pos.x, pos.y)) * mv_rate
                            / boat.move_rate() as i32
                    }
                } else if !same_continent(state, unit.pos, pos)
                    || costs.cost(pos.x, pos.y) > config.travel_threshold * unit.move_rate()
                {
                    if !state.map.is_water_adjacent(pos.x, pos.y) {
                        NO_ROUTE
                    } else if let Some(boat) =
                        ferry.and_then(|id| state.unit(id))
                    {
                        let to_boat = capped(costs.cost(boat.pos.x, boat.pos.y));
                        if to_boat >= NO_ROUTE {
                            NO_ROUTE
                        } else {
                            to_boat + state.map.distance(boat.pos, pos) + mv_rate
                        }
                    } else if is_virtual && ferry_requested {
                        // the requested boat launches from the home
                        // settlement's own berth
                        match home {
                            Some(city) => {
                                w_virtual = true;
                                let to_berth =
                                    capped(costs.cost(city.pos.x, city.pos.y));
                                if to_berth >= NO_ROUTE {
                                    NO_ROUTE
                                } else {
                                    to_berth
                                        + state.map.distance(city.pos, pos)
                                        + mv_rate
                                }
                            }
                            None => NO_ROUTE,
                        }
                    } else if !is_virtual
                        || home.map_or(true, |city| {
                            !state.map.is_water_adjacent(city.pos.x, city.pos.y)
                        })
                    {
                        NO_ROUTE
                    } else {
                        w_virtual = true;
                        capped(costs.sea_cost(pos.x, pos.y)) * mv_rate
                            / config.virtual_sea_divisor as i32
                    }
                } else {
                    capped(costs.cost(pos.x, pos.y))
                };

                // doubling the delay keeps new settlements from clustering
                // halfway along the path to the last one
                let d = (mv_cost / mv_rate) * 2;
                let b = site.desirability(state, territory, unit.owner, pos.x, pos.y);
                let mut newv = discount(b, d);

                let mut upkeep = food_upkeep * config.food_weighting * config.mort;
                if site_cont != ucont {
                    upkeep += config.shield_weighting * config.mort;
                }
                newv -= upkeep - discount(upkeep, d);
                newv = (newv * 100)
                    / config.mort
                    / ((if w_virtual { 80 } else { 40 }) + food_cost);

                if best_score > 0 && state.city_at(pos.x, pos.y).is_some() {
                    newv = 0;
                }
                if newv > 0 && player.expand != 100 {
                    newv = (newv * player.expand) / 100;
                }

                if site_cont != ucont
                    && !player.tech.navigation
                    && near >= config.founder_near_limit
                {
                    // reachable only once sea routes open up; becomes a
                    // ferry-production want rather than a goal
                    if is_virtual && newv > ferry_choice {
                        ferry_choice = newv;
                    }
                } else if newv > best_score {
                    best_score = newv;
                    action = GoalAction::Found;
                    target = if w_virtual { None } else { Some(pos) };
                }
            }
        }
    }

    let ferry_want = (ferry_choice - best_score).max(0);

    Evaluation {
        score: best_score,
        action,
        target,
        ferry_want,
    }
}

/// Running best improvement candidate with the uniform consideration rule
struct BestAction {
    score: i32,
    /// Pre-discount value of the winning tile; ties go to the higher one
    oldv: i32,
    target: Option<(Activity, Pos)>,
}

impl BestAction {
    fn new() -> Self {
        Self {
            score: 0,
            // not zero, so zero-score candidates are never selected
            oldv: 9999,
            target: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn consider(
        &mut self,
        state: &GameState,
        activity: Activity,
        extra: i32,
        newv: i32,
        oldv: i32,
        in_use: bool,
        d: i32,
        x: i32,
        y: i32,
    ) {
        let config = &state.config;
        let eligible = if extra >= 0 { newv >= 0 } else { newv >= oldv };
        let score = if eligible {
            let mut newv = newv;
            if extra >= 0 {
                newv = newv.max(oldv) + extra;
            }
            // worked tiles pay off immediately and weigh double
            let weight = if in_use {
                config.used_tile_weight
            } else {
                config.unused_tile_weight
            };
            let b = ((newv - oldv) * weight).max(config.mort);
            let a = discount(b, d);
            // two-sided amortized return folded into one magnitude
            ((i64::from(a) * i64::from(b) / i64::from((b - a).max(1))) as i32)
                / config.used_tile_weight
        } else {
            0
        };

        if score > self.score || (score == self.score && oldv > self.oldv) {
            tracing::debug!(
                ?activity,
                x,
                y,
                score,
                d,
                "replacing best improvement candidate"
            );
            self.score = score;
            self.oldv = oldv;
            self.target = Some((activity, Pos::new(x, y)));
        }
    }
}

/// Connectivity value of laying road or rail at a cell: counts adjacent
/// links that would join up without an existing parallel link, discounted
/// around impassable flanks. Units already building on a neighbor count as
/// existing links.
fn road_bonus(state: &GameState, x: i32, y: i32, feature: Features) -> i32 {
    const II: [i32; 12] = [-1, 0, 1, -1, 1, -1, 0, 1, 0, -2, 2, 0];
    const JJ: [i32; 12] = [-1, -1, -1, 0, 0, 1, 1, 1, -2, 0, 0, 2];
    let mut rd = [false; 12];
    let mut te = [false; 12];
    for k in 0..12 {
        let (x1, y1) = (x + II[k], y + JJ[k]);
        match state.map.tile(x1, y1) {
            None => {
                rd[k] = false;
            }
            Some(tile) => {
                rd[k] = tile.features.has(feature);
                te[k] = tile.terrain == Terrain::Mountains || tile.terrain.is_water();
                if !rd[k] {
                    rd[k] = state
                        .units_at(x1, y1)
                        .any(|u| matches!(u.activity, Activity::Road | Activity::Railroad));
                }
            }
        }
    }

    let mut m = 0;
    if rd[0] && !rd[1] && !rd[3] && (!rd[2] || !rd[8]) && (!te[2] || !te[4] || !te[7] || !te[6] || !te[5]) {
        m += 1;
    }
    if rd[2] && !rd[1] && !rd[4] && (!rd[7] || !rd[10]) && (!te[0] || !te[3] || !te[7] || !te[6] || !te[5]) {
        m += 1;
    }
    if rd[5] && !rd[6] && !rd[3] && (!rd[5] || !rd[11]) && (!te[2] || !te[4] || !te[7] || !te[1] || !te[0]) {
        m += 1;
    }
    if rd[7] && !rd[6] && !rd[4] && (!rd[0] || !rd[9]) && (!te[2] || !te[3] || !te[0] || !te[1] || !te[5]) {
        m += 1;
    }
    if rd[1] && !rd[4] && !rd[3] && (!te[5] || !te[6] || !te[7]) {
        m += 1;
    }
    if rd[3] && !rd[1] && !rd[6] && (!te[2] || !te[4] || !te[7]) {
        m += 1;
    }
    if rd[4] && !rd[1] && !rd[6] && (!te[0] || !te[3] || !te[5]) {
        m += 1;
    }
    if rd[6] && !rd[4] && !rd[3] && (!te[0] || !te[1] || !te[2]) {
        m += 1;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::PlayerId;
    use crate::engine::territory::rebuild_grids;
    use crate::game::unit::UnitKind;
    use crate::map::grid::GameMap;

    struct Fixture {
        state: GameState,
        site: SiteGrid,
        territory: TerritoryGrid,
        claims: ClaimGrid,
        player: PlayerId,
    }

    fn fixture(width: i32, height: i32) -> Fixture {
        let mut map = GameMap::filled(width, height, Terrain::Grassland);
        map.assign_continents();
        let mut state = GameState::new(map, EngineConfig::default());
        let player = state.add_player("alpha");
        let site = SiteGrid::new(&state);
        let territory = TerritoryGrid::new(&state);
        let claims = ClaimGrid::new(&state);
        Fixture {
            state,
            site,
            territory,
            claims,
            player,
        }
    }

    fn prepare(fx: &mut Fixture) {
        let order: Vec<PlayerId> = fx.state.players.iter().map(|p| p.id).collect();
        fx.site.generate(&fx.state);
        rebuild_grids(&mut fx.territory, &mut fx.claims, &fx.state, &order);
        let city_ids: Vec<CityId> = fx.state.cities().map(|c| c.id).collect();
        for id in city_ids {
            improvements::refresh(&mut fx.state, id);
        }
    }

    #[test]
    fn test_settler_travels_to_mine_hill() {
        let mut fx = fixture(24, 24);
        // a city whose only standout tile is a hill ripe for mining
        let founder = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(10, 10));
        fx.state.found_city(founder).unwrap();
        fx.state.map.set_terrain(11, 10, Terrain::Hills);
        fx.state.map.assign_continents();
        let worker = fx
            .state
            .spawn_unit(fx.player, UnitKind::Engineers, Pos::new(12, 12));
        fx.state.unit_mut(worker).unwrap().auto = true;
        prepare(&mut fx);

        let score = find_work(
            &mut fx.state,
            &mut fx.site,
            &mut fx.territory,
            &mut fx.claims,
            worker,
        );
        assert!(score > 0);
        let unit = fx.state.unit(worker).unwrap();
        assert_eq!(unit.role, UnitRole::AutoImprove);
        assert_eq!(unit.travel_target, Some(Pos::new(11, 10)));
        // the claim sticks for later units this pass
        let probe = fx.state.spawn_unit(fx.player, UnitKind::Engineers, Pos::new(12, 13));
        let probe = fx.state.unit(probe).unwrap().clone();
        assert!(fx.claims.is_claimed(&fx.state, &probe, 11, 10));
    }

    #[test]
    fn test_settler_on_goal_mines_in_place() {
        let mut fx = fixture(24, 24);
        let founder = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(10, 10));
        fx.state.found_city(founder).unwrap();
        fx.state.map.set_terrain(11, 10, Terrain::Hills);
        fx.state.map.assign_continents();
        let worker = fx
            .state
            .spawn_unit(fx.player, UnitKind::Engineers, Pos::new(11, 10));
        fx.state.unit_mut(worker).unwrap().auto = true;
        prepare(&mut fx);

        find_work(
            &mut fx.state,
            &mut fx.site,
            &mut fx.territory,
            &mut fx.claims,
            worker,
        );
        assert_eq!(fx.state.unit(worker).unwrap().activity, Activity::Mine);
    }

    #[test]
    fn test_two_founders_pick_distinct_goals() {
        let mut fx = fixture(40, 40);
        let a = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(20, 20));
        let b = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(21, 20));
        fx.state.unit_mut(a).unwrap().auto = true;
        fx.state.unit_mut(b).unwrap().auto = true;
        prepare(&mut fx);

        find_work(&mut fx.state, &mut fx.site, &mut fx.territory, &mut fx.claims, a);
        find_work(&mut fx.state, &mut fx.site, &mut fx.territory, &mut fx.claims, b);

        // the first settler founds on the spot and is consumed by it
        assert_eq!(fx.state.cities().count(), 1);
        assert!(fx.state.unit(a).is_none());
        let city_pos = fx.state.cities().next().unwrap().pos;
        assert_eq!(city_pos, Pos::new(20, 20));

        // the second must not converge on the same site
        let second = fx.state.unit(b).unwrap();
        match second.role {
            UnitRole::FoundCity => {
                let target = second.travel_target.unwrap_or(second.pos);
                assert_ne!(target, city_pos);
            }
            UnitRole::AutoImprove => {}
            UnitRole::None => assert!(!second.auto),
        }
    }

    #[test]
    fn test_settler_founds_on_rough_terrain() {
        let mut fx = fixture(24, 24);
        for y in 0..24 {
            for x in 0..24 {
                fx.state.map.set_terrain(x, y, Terrain::Tundra);
            }
        }
        fx.state.map.assign_continents();
        let settler = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(12, 12));
        fx.state.unit_mut(settler).unwrap().auto = true;
        prepare(&mut fx);

        let score = find_work(
            &mut fx.state,
            &mut fx.site,
            &mut fx.territory,
            &mut fx.claims,
            settler,
        );
        assert!(score > 0);
        assert_eq!(fx.state.cities().count(), 1);
    }

    #[test]
    fn test_no_work_clears_automation() {
        let mut fx = fixture(8, 8);
        // all water except a single glacier islet: nothing to improve,
        // nowhere to found
        for y in 0..8 {
            for x in 0..8 {
                fx.state.map.set_terrain(x, y, Terrain::Ocean);
            }
        }
        fx.state.map.set_terrain(4, 4, Terrain::Glacier);
        fx.state.map.assign_continents();
        let lost = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(4, 4));
        fx.state.unit_mut(lost).unwrap().auto = true;
        prepare(&mut fx);

        let score = find_work(
            &mut fx.state,
            &mut fx.site,
            &mut fx.territory,
            &mut fx.claims,
            lost,
        );
        assert_eq!(score, 0);
        assert!(!fx.state.unit(lost).unwrap().auto);
    }

    #[test]
    fn test_probe_want_positive_and_pure() {
        let mut fx = fixture(30, 30);
        let founder = fx
            .state
            .spawn_unit(fx.player, UnitKind::Settlers, Pos::new(15, 15));
        let city_id = fx.state.found_city(founder).unwrap();
        prepare(&mut fx);

        let units_before = fx.state.units().count();
        let want = probe_want(
            &fx.state,
            &mut fx.site,
            &fx.territory,
            &fx.claims,
            city_id,
            UnitKind::Settlers,
        );
        // open grassland in every direction: founding want is positive
        assert!(want.want != 0);
        // the probe registered nothing and ordered nothing
        assert_eq!(fx.state.units().count(), units_before);
        assert!(fx.state.units().all(|u| u.travel_target.is_none()));
    }

    #[test]
    fn test_probe_weights_requested_boat_route_as_virtual() {
        // one-tile home island, all prospects across open water
        let mut map = GameMap::filled(20, 10, Terrain::Ocean);
        map.set_terrain(3, 5, Terrain::Grassland);
        for y in 3..8 {
            for x in 13..18 {
                map.set_terrain(x, y, Terrain::Grassland);
            }
        }
        map.assign_continents();
        let mut state = GameState::new(map, EngineConfig::default());
        let player = state.add_player("alpha");
        state.player_mut(player).tech.navigation = true;
        let founder = state.spawn_unit(player, UnitKind::Settlers, Pos::new(3, 5));
        let city_id = state.found_city(founder).unwrap();
        // a settler already waiting on a boat this settlement must build
        let waiting = state.spawn_unit(player, UnitKind::Settlers, Pos::new(3, 5));
        {
            let unit = state.unit_mut(waiting).unwrap();
            unit.home_city = Some(city_id);
            unit.ferry = Some(FERRY_REQUESTED);
        }
        let mut site = SiteGrid::new(&state);
        site.generate(&state);
        let mut territory = TerritoryGrid::new(&state);
        let mut claims = ClaimGrid::new(&state);
        rebuild_grids(&mut territory, &mut claims, &state, &[player]);

        let want = probe_want(
            &state,
            &mut site,
            &territory,
            &claims,
            city_id,
            UnitKind::Settlers,
        );
        // the route rides a boat that does not exist yet, so the want is
        // real but the prospect has no reachable target
        assert!(want.want < 0);
    }

    #[test]
    fn test_road_bonus_counts_links() {
        let mut fx = fixture(12, 12);
        assert_eq!(road_bonus(&fx.state, 5, 5, Features::ROAD), 0);
        // a lone road to the north is a link worth joining
        fx.state.map.add_feature(5, 4, Features::ROAD);
        assert!(road_bonus(&fx.state, 5, 5, Features::ROAD) > 0);
    }
}
