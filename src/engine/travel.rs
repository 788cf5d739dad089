//! Travel-cost oracle seam
//!
//! Goal selection only ever asks "how expensive is it to get there", so the
//! pathfinder behind that question is a trait. The crate ships `Warmap`, a
//! plain Dijkstra over terrain movement costs with separate land and sea
//! layers, good enough for tests and as a default oracle.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::core::types::{Pos, UnitId};
use crate::game::state::GameState;
use crate::game::unit::{Unit, MOVE_POINTS_PER_TILE};
use crate::map::grid::CellGrid;
use crate::map::tile::Features;

/// Cost of a cell no route reaches
pub const UNREACHABLE: u32 = u32::MAX;

/// Movement-cost oracle, anchored at one unit's position
pub trait TravelCosts {
    /// Overland move-point cost from the anchor to `(x, y)`
    fn cost(&self, x: i32, y: i32) -> u32;

    /// Sea move-point cost from the anchor's coast to `(x, y)`; landing on a
    /// final coastal cell is included
    fn sea_cost(&self, x: i32, y: i32) -> u32;

    fn is_route_feasible(&self, x: i32, y: i32) -> bool {
        self.cost(x, y) != UNREACHABLE
    }
}

/// Dijkstra cost fields radiating from a single origin
///
/// The land layer walks land cells only, entering a cell for 1 move point
/// along a road or rail and the terrain cost otherwise. The sea layer walks
/// water at a flat rate and finalizes, but never expands, coastal land
/// cells, so ferry drop-off estimates are directly readable.
#[derive(Debug, Clone)]
pub struct Warmap {
    land: CellGrid<u32>,
    sea: CellGrid<u32>,
}

impl Warmap {
    pub fn build(state: &GameState, origin: Pos) -> Self {
        let mut warmap = Self {
            land: CellGrid::matching(&state.map),
            sea: CellGrid::matching(&state.map),
        };
        warmap.land.fill(UNREACHABLE);
        warmap.sea.fill(UNREACHABLE);
        warmap.flood_land(state, origin);
        warmap.flood_sea(state, origin);
        warmap
    }

    /// Anchor a warmap at a unit; sailing units get their origin treated as
    /// water even when docked in a settlement
    pub fn for_unit(state: &GameState, unit: &Unit) -> Self {
        Self::build(state, unit.pos)
    }

    fn flood_land(&mut self, state: &GameState, origin: Pos) {
        let mut heap = BinaryHeap::new();
        self.land.set(origin.x, origin.y, 0);
        heap.push(Reverse((0u32, origin.x, origin.y)));
        while let Some(Reverse((cost, x, y))) = heap.pop() {
            if cost > self.land.get(x, y) {
                continue;
            }
            for npos in state.map.neighbors(x, y) {
                let Some(tile) = state.map.tile(npos.x, npos.y) else {
                    continue;
                };
                if tile.terrain.is_water() {
                    continue;
                }
                let step = if tile.features.has(Features::ROAD)
                    || tile.features.has(Features::RAILROAD)
                {
                    1
                } else {
                    tile.terrain.spec().move_cost
                };
                let next = cost.saturating_add(step);
                if next < self.land.get(npos.x, npos.y) {
                    self.land.set(npos.x, npos.y, next);
                    heap.push(Reverse((next, npos.x, npos.y)));
                }
            }
        }
    }

    fn flood_sea(&mut self, state: &GameState, origin: Pos) {
        let mut heap = BinaryHeap::new();
        // seed the origin itself plus, for a docked land origin, every
        // adjacent water cell
        self.sea.set(origin.x, origin.y, 0);
        heap.push(Reverse((0u32, origin.x, origin.y)));
        while let Some(Reverse((cost, x, y))) = heap.pop() {
            if cost > self.sea.get(x, y) {
                continue;
            }
            let on_water = state
                .map
                .terrain(x, y)
                .map_or(false, |terrain| terrain.is_water());
            // only water cells (and the origin) expand further
            if !on_water && cost > 0 {
                continue;
            }
            for npos in state.map.neighbors(x, y) {
                let next = cost.saturating_add(MOVE_POINTS_PER_TILE);
                if next < self.sea.get(npos.x, npos.y) {
                    self.sea.set(npos.x, npos.y, next);
                    heap.push(Reverse((next, npos.x, npos.y)));
                }
            }
        }
    }
}

impl TravelCosts for Warmap {
    fn cost(&self, x: i32, y: i32) -> u32 {
        self.land.get(x, y)
    }

    fn sea_cost(&self, x: i32, y: i32) -> u32 {
        self.sea.get(x, y)
    }
}

/// Whether an overland route between two cells can exist at all
pub fn same_continent(state: &GameState, a: Pos, b: Pos) -> bool {
    match (state.map.continent(a.x, a.y), state.map.continent(b.x, b.y)) {
        (Some(ca), Some(cb)) => ca != 0 && ca == cb,
        _ => false,
    }
}

/// Closest transport with a free berth reachable by sea within the
/// configured search limit
pub fn find_ferry(state: &GameState, costs: &dyn TravelCosts, unit: &Unit) -> Option<UnitId> {
    let limit = state.config.ferry_search_limit;
    let mut best: Option<(u32, UnitId)> = None;
    for candidate in state.units_of(unit.owner) {
        let spec = candidate.kind.spec();
        if spec.transport_capacity == 0 || candidate.passenger.is_some() {
            continue;
        }
        let cost = costs.sea_cost(candidate.pos.x, candidate.pos.y);
        if cost > limit {
            continue;
        }
        if best.map_or(true, |(bc, _)| cost < bc) {
            best = Some((cost, candidate.id));
        }
    }
    if let Some((cost, id)) = best {
        tracing::debug!(unit = unit.id.0, ferry = id.0, cost, "ferry found");
    }
    best.map(|(_, id)| id)
}
