//! Map-wide settlement-site desirability cache
//!
//! One signed integer per cell: negative means "inside some settlement's
//! effective radius, not a legal site", zero means "not evaluated yet",
//! positive is a memoized desirability score. The expensive evaluation is a
//! greedy allocation of the site's workable grid, simulating settlement
//! growth tile by tile with a food-box delay and discounting every addition.

use crate::core::types::PlayerId;
use crate::engine::discount::discount;
use crate::engine::territory::TerritoryGrid;
use crate::game::city::{work_offsets, WORK_GRID, WORK_RADIUS};
use crate::game::state::GameState;
use crate::map::grid::CellGrid;
use crate::map::tile::{Features, Tile};

type WorkArray = [[i32; WORK_GRID]; WORK_GRID];

/// The cached desirability grid plus the claimed/near-settlement overlay
#[derive(Debug, Clone)]
pub struct SiteGrid {
    cells: CellGrid<i32>,
}

impl SiteGrid {
    pub fn new(state: &GameState) -> Self {
        Self {
            cells: CellGrid::matching(&state.map),
        }
    }

    /// Raw cached value at a cell
    pub fn value(&self, x: i32, y: i32) -> i32 {
        self.cells.get(x, y)
    }

    /// Wholesale rebuild: stamp every settlement's workable radius negative
    pub fn generate(&mut self, state: &GameState) {
        self.cells.fill(0);
        for city in state.cities() {
            for (i, j) in work_offsets() {
                let (x, y) = city.offset_pos(i, j);
                self.cells.update(x, y, |v| v - 1);
            }
        }
    }

    /// Incremental patch for a pending founding order at `(x, y)`
    ///
    /// Two-tier falloff by squared distance: the inner disk becomes (more)
    /// claimed, the outer ring only invalidates positive cached scores.
    pub fn add_pending(&mut self, x: i32, y: i32) {
        tracing::debug!(x, y, "adding pending settlement to site grid");
        self.patch_pending(x, y, true);
    }

    /// Revert of `add_pending`, applied when a founding order is dropped
    pub fn remove_pending(&mut self, x: i32, y: i32) {
        tracing::debug!(x, y, "removing pending settlement from site grid");
        self.patch_pending(x, y, false);
    }

    fn patch_pending(&mut self, x: i32, y: i32, add: bool) {
        for j in -4..=4 {
            for i in -4..=4i32 {
                let n = i * i + j * j;
                if n <= 5 {
                    self.cells.update(x + i, y + j, |v| {
                        if add {
                            if v < 0 {
                                v - 1
                            } else {
                                -1
                            }
                        } else if v < 0 {
                            v + 1
                        } else {
                            0
                        }
                    });
                } else if n <= 20 {
                    self.cells.update(x + i, y + j, |v| if v > 0 { 0 } else { v });
                }
            }
        }
    }

    /// Desirability of founding (or growing) a settlement at `(x, y)`
    ///
    /// Early exits: threatened or water cells are worthless; a settlement at
    /// the size cap takes no more immigrants; a negative cache entry means
    /// the cell sits in somebody's radius; a positive one is a memo hit.
    pub fn desirability(
        &mut self,
        state: &GameState,
        territory: &TerritoryGrid,
        player: PlayerId,
        x: i32,
        y: i32,
    ) -> i32 {
        if territory.is_threatened(player, x, y) {
            return 0;
        }
        let Some(center) = state.map.tile(x, y).copied() else {
            return 0;
        };
        if center.terrain.is_water() {
            return 0;
        }
        let site_city = state.city_at(x, y);
        if let Some(city) = site_city {
            if city.size >= state.config.add_to_size_limit {
                return 0;
            }
        }
        let cached = self.cells.get(x, y);
        if site_city.is_none() {
            if cached < 0 {
                return 0;
            }
            if cached > 0 {
                return cached;
            }
        }

        let config = &state.config;
        let mort = config.mort;
        let sh = config.shield_weighting * mort;
        let t = config.trade_weighting * mort;
        let harbor = state.map.is_water_adjacent(x, y);
        let continent = center.continent;

        let mut food: WorkArray = Default::default();
        let mut shield: WorkArray = Default::default();
        let mut trade: WorkArray = Default::default();
        let mut irrig: WorkArray = Default::default();
        let mut mine: WorkArray = Default::default();
        let mut road: WorkArray = Default::default();

        for (i, j) in work_offsets() {
            // for a fresh site only cells outside everyone's radius count;
            // for an existing settlement only unassigned offsets do
            let free = match site_city {
                None => self.cells.get(
                    x + i as i32 - WORK_RADIUS,
                    y + j as i32 - WORK_RADIUS,
                ) >= 0,
                Some(city) => city.status(i, j) == crate::game::city::WorkStatus::Empty,
            };
            if !free {
                continue;
            }
            let tx = x + i as i32 - WORK_RADIUS;
            let ty = y + j as i32 - WORK_RADIUS;
            let Some(tile) = state.map.tile(tx, ty).copied() else {
                continue;
            };
            let spec = tile.terrain.spec();
            let (base_food, base_shield, base_trade) = base_yields(&tile);
            let center_offset = i == 2 && j == 2;

            food[i][j] = (base_food - 2) * mort;
            if center_offset {
                food[i][j] += 2 * mort;
            }

            if spec.irrigation_result == Some(tile.terrain) && tile.continent == continent {
                if tile.features.has(Features::IRRIGATION) || center_offset {
                    irrig[i][j] = mort * spec.irrigation_food_incr;
                } else if state.map.is_water_adjacent(tx, ty)
                    && tile.terrain != crate::map::terrain::Terrain::Hills
                {
                    // flat deduction approximates the discounted build delay
                    irrig[i][j] = mort * spec.irrigation_food_incr - 9;
                }
            } else if tile.terrain.is_water() && harbor {
                food[i][j] += mort;
            }

            shield[i][j] = base_shield * sh;
            if center_offset && shield[i][j] == 0 {
                shield[i][j] = sh;
            }
            if tile.terrain.is_water() && harbor {
                shield[i][j] += sh;
            }

            if tile.features.has(Features::MINE) {
                mine[i][j] = sh * spec.mining_shield_incr;
            } else if tile.terrain == crate::map::terrain::Terrain::Hills
                && tile.continent == continent
            {
                mine[i][j] = sh * spec.mining_shield_incr - 300;
            }

            trade[i][j] = base_trade * t;
            if spec.road_trade_incr > 0 {
                if tile.features.has(Features::ROAD) || center_offset {
                    road[i][j] = t * spec.road_trade_incr;
                } else if tile.continent == continent {
                    road[i][j] = t * spec.road_trade_incr - 70;
                }
            }
            if trade[i][j] != 0 {
                trade[i][j] += t;
            } else if road[i][j] != 0 {
                road[i][j] += t;
            }
        }

        if let Some(city) = site_city {
            // growth-by-immigration: value of the single best next tile
            let n = city.size;
            let mut best = 0;
            let (mut ii, mut jj) = (0usize, 0usize);
            for (i, j) in work_offsets() {
                let cur = food[i][j] * config.food_weight_for_size(n)
                    + (shield[i][j] + mine[i][j])
                    + (trade[i][j] + road[i][j]);
                if cur > best && (i != 2 || j != 2) {
                    best = cur;
                    ii = i;
                    jj = j;
                }
            }
            if best == 0 {
                return 0;
            }
            let mut val = (shield[ii][jj] + mine[ii][jj])
                + (food[ii][jj] + irrig[ii][jj]) * config.food_weighting
                + (trade[ii][jj] + road[ii][jj]);
            val -= discount(
                config.settler_deterrent_shields * config.shield_weighting
                    + config.settler_deterrent_food * config.food_weighting,
                12,
            );
            tracing::debug!(x, y, val, "immigration desirability");
            return val;
        }

        // fresh-site branch: greedy radius allocation
        let mut taken: [[bool; WORK_GRID]; WORK_GRID] = Default::default();
        let mut f = food[2][2] + irrig[2][2];
        if f == 0 {
            // a site that cannot feed itself is no site at all
            return 0;
        }
        let mut val = f * config.food_weighting
            + (shield[2][2] + mine[2][2])
            + (trade[2][2] + road[2][2]);
        taken[2][2] = true;

        let mut db = center.terrain.spec().defense_bonus;
        if center.features.has(Features::RIVER) {
            db += db / 2;
        }
        val += (4 * db - 40) * config.shield_weighting;
        val += config.science_bonus * mort;

        let mut delay = 0;
        let mut step = 1;
        let mut best = 0;
        let mut settler_deterred_val = 0;
        let mut temple_cost = 0;
        while step <= config.max_growth_steps as i32 && f > 0 {
            let mut retry = true;
            while retry {
                retry = false;
                best = 0;
                let mut second_best = 0;
                let mut worst = -1;
                let (mut ii, mut jj) = (0usize, 0usize);
                let (mut wi, mut wj) = (0usize, 0usize);
                for (i, j) in work_offsets() {
                    let cur = food[i][j] * config.food_weight_for_size(step as u8)
                        + (shield[i][j] + mine[i][j])
                        + (trade[i][j] + road[i][j]);
                    if !taken[i][j] {
                        if cur > best {
                            second_best = best;
                            best = cur;
                            ii = i;
                            jj = j;
                        } else if cur > second_best {
                            second_best = cur;
                        }
                    } else if (i != 2 || j != 2) && (cur < worst || worst < 0) {
                        worst = cur;
                        wi = i;
                        wj = j;
                    }
                }
                if best == 0 {
                    break;
                }
                let gained = discount(
                    (shield[ii][jj] + mine[ii][jj])
                        + (food[ii][jj] + irrig[ii][jj]) * config.food_weighting
                        + (trade[ii][jj] + road[ii][jj]),
                    delay,
                );
                f += food[ii][jj] + irrig[ii][jj];
                if gained > 0 {
                    val += gained;
                }
                taken[ii][jj] = true;

                // a taken cell now dominated by an untaken one gets evicted
                // and the step retried; each retry swaps a strictly better
                // cell in, so the loop reaches a fixed point
                if worst >= 0 && worst < second_best {
                    let lost = discount(
                        (shield[wi][wj] + mine[wi][wj]) + (trade[wi][wj] + road[wi][wj]),
                        delay,
                    );
                    f -= food[wi][wj] + irrig[wi][wj];
                    val -= lost;
                    taken[wi][wj] = false;
                    retry = true;
                }
            }
            if best == 0 {
                break;
            }
            if f > 0 {
                delay += (config.foodbox * mort * step + f - 1) / f;
            }
            if step == 4 {
                // consuming a settler and building a temple both come due
                // around the fourth growth step
                val -= discount(
                    config.settler_deterrent_shields * config.shield_weighting
                        + config.settler_deterrent_food * config.food_weighting,
                    delay,
                );
                temple_cost = discount(
                    config.settler_deterrent_shields * config.shield_weighting,
                    delay,
                );
                settler_deterred_val = val;
            }
            step += 1;
        }
        if step > 4 {
            if val - temple_cost > settler_deterred_val {
                val -= temple_cost;
            } else {
                val = settler_deterred_val;
            }
        }
        val -= config.defense_deterrent * config.shield_weighting;

        self.cells.set(x, y, val);
        tracing::debug!(x, y, val, steps = step, "site desirability cached");
        val
    }
}

/// Terrain-and-resource yields before any buildable improvement
fn base_yields(tile: &Tile) -> (i32, i32, i32) {
    let spec = tile.terrain.spec();
    let food = spec.food;
    let mut shields = spec.shields;
    let mut trade = spec.trade;
    if tile.features.has(Features::RESOURCE) {
        shields += 1;
        trade += 1;
    }
    if tile.features.has(Features::RIVER) {
        trade += 1;
    }
    (food, shields, trade)
}
