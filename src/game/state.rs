//! Process-wide game state and the command sink
//!
//! Holds the map, players, units, and settlements, and exposes the narrow
//! mutation surface the engine is allowed to use: set activity, issue a
//! travel order, found a settlement. Orders are fire-and-forget, but any of
//! them may destroy the issuing unit (a travel leg can end on a fatal tile),
//! so callers must re-check the unit after every order.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::error::{HomesteadError, Result};
use crate::core::types::{CityId, PlayerId, Pos, Turn, UnitId};
use crate::game::city::{delta_in_radius, work_offsets, City, WorkStatus, WORK_RADIUS};
use crate::game::player::{Player, TechFlags};
use crate::game::unit::{Activity, Unit, UnitKind};
use crate::map::grid::GameMap;
use crate::map::tile::{Features, Tile};

/// Food/shield/trade yields of one tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Yields {
    pub food: i32,
    pub shields: i32,
    pub trade: i32,
}

/// The whole mutable world the engine operates on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub map: GameMap,
    pub config: EngineConfig,
    pub players: Vec<Player>,
    units: Vec<Unit>,
    #[serde(skip)]
    unit_index: AHashMap<UnitId, usize>,
    cities: Vec<City>,
    #[serde(skip)]
    city_index: AHashMap<CityId, usize>,
    next_unit_id: u32,
    next_city_id: u32,
    pub turn: Turn,
    /// Global hazard counters; drive per-player hazard pressure
    pub global_warming: i32,
    pub heating: i32,
    /// Tiles that destroy any unit entering them. Stands in for external
    /// systems (combat, sinking) that can kill a unit mid-travel.
    pub fatal_tiles: AHashSet<(i32, i32)>,
}

impl GameState {
    pub fn new(map: GameMap, config: EngineConfig) -> Self {
        Self {
            map,
            config,
            players: Vec::new(),
            units: Vec::new(),
            unit_index: AHashMap::new(),
            cities: Vec::new(),
            city_index: AHashMap::new(),
            next_unit_id: 1,
            next_city_id: 1,
            turn: 0,
            global_warming: 0,
            heating: 0,
            fatal_tiles: AHashSet::new(),
        }
    }

    // === Players ===

    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = PlayerId(self.players.len() as u8);
        assert!(self.players.len() < 32, "bitmask grids support 32 players");
        self.players.push(Player::new(id, name));
        id
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.0 as usize]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.0 as usize]
    }

    /// Total citizens across a player's settlements
    pub fn citizens(&self, id: PlayerId) -> i32 {
        self.cities
            .iter()
            .filter(|city| city.owner == id)
            .map(|city| i32::from(city.size))
            .sum()
    }

    // === Units ===

    pub fn spawn_unit(&mut self, owner: PlayerId, kind: UnitKind, pos: Pos) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.unit_index.insert(id, self.units.len());
        self.units.push(Unit::new(id, owner, kind, pos));
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit_index.get(&id).map(|&idx| &self.units[idx])
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.unit_index.get(&id).map(|&idx| &mut self.units[idx])
    }

    /// Units in storage order; the claim grid is mutated incrementally
    /// during a pass, so this order is part of the engine's semantics
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |unit| unit.owner == owner)
    }

    pub fn units_at(&self, x: i32, y: i32) -> impl Iterator<Item = &Unit> + '_ {
        let pos = self.map.normalize(x, y);
        self.units
            .iter()
            .filter(move |unit| Some(unit.pos) == pos)
    }

    pub fn destroy_unit(&mut self, id: UnitId) {
        if let Some(idx) = self.unit_index.remove(&id) {
            self.units.remove(idx);
            self.reindex_units();
        }
    }

    fn reindex_units(&mut self) {
        self.unit_index = self
            .units
            .iter()
            .enumerate()
            .map(|(idx, unit)| (unit.id, idx))
            .collect();
    }

    /// Rebuild the id indexes after deserialization
    pub fn rebuild_indexes(&mut self) {
        self.reindex_units();
        self.city_index = self
            .cities
            .iter()
            .enumerate()
            .map(|(idx, city)| (city.id, idx))
            .collect();
    }

    // === Cities ===

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.city_index.get(&id).map(|&idx| &self.cities[idx])
    }

    pub fn city_mut(&mut self, id: CityId) -> Option<&mut City> {
        self.city_index.get(&id).map(|&idx| &mut self.cities[idx])
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn cities_of(&self, owner: PlayerId) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(move |city| city.owner == owner)
    }

    pub fn city_at(&self, x: i32, y: i32) -> Option<&City> {
        let pos = self.map.normalize(x, y)?;
        self.cities.iter().find(|city| city.pos == pos)
    }

    pub fn remove_city(&mut self, id: CityId) {
        if let Some(idx) = self.city_index.remove(&id) {
            self.cities.remove(idx);
            self.rebuild_indexes();
        }
    }

    // === Tile valuation ===

    /// Yields of a tile as seen by a player (tech gates farmland)
    pub fn tile_yields(&self, tile: &Tile, tech: TechFlags) -> Yields {
        let spec = tile.terrain.spec();
        let features = tile.features;

        let mut food = spec.food;
        if features.has(Features::IRRIGATION) {
            food += spec.irrigation_food_incr;
        }
        if features.has(Features::FARMLAND) && tech.farmland {
            food += food / 2;
        }

        let mut shields = spec.shields;
        if features.has(Features::MINE) {
            shields += spec.mining_shield_incr;
        }
        if features.has(Features::RAILROAD) {
            shields += shields / 2;
        }

        let mut trade = spec.trade;
        if features.has(Features::RIVER) {
            trade += 1;
        }
        if features.has(Features::ROAD) {
            trade += spec.road_trade_incr;
        }

        if features.has(Features::RESOURCE) {
            shields += 1;
            trade += 1;
        }

        // hazards halve everything, twice over if both are present
        if features.has(Features::POLLUTION) {
            food /= 2;
            shields /= 2;
            trade /= 2;
        }
        if features.has(Features::FALLOUT) {
            food /= 2;
            shields /= 2;
            trade /= 2;
        }

        Yields {
            food,
            shields,
            trade,
        }
    }

    /// Weighted worth of one workable offset under current assignments
    pub fn city_tile_value(&self, city: &City, i: usize, j: usize) -> i32 {
        let (x, y) = city.offset_pos(i, j);
        match self.map.tile(x, y) {
            Some(tile) => self.weigh_tile(city, *tile),
            None => 0,
        }
    }

    /// Same valuation but against a hypothetical tile, so improvement
    /// probes never have to mutate and revert shared map state
    pub fn city_tile_value_with(&self, city: &City, probe: Tile) -> i32 {
        self.weigh_tile(city, probe)
    }

    fn weigh_tile(&self, city: &City, tile: Tile) -> i32 {
        let tech = self.player(city.owner).tech;
        let yields = self.tile_yields(&tile, tech);
        yields.food * self.config.food_weighting
            + yields.shields * self.config.shield_weighting
            + yields.trade * self.config.trade_weighting
    }

    /// Best value among tiles currently worked by citizens; baseline for
    /// the hazard-cleanup probes
    pub fn best_worker_tile_value(&self, city: &City) -> i32 {
        work_offsets()
            .filter(|&(i, j)| city.status(i, j) == WorkStatus::Worker)
            .map(|(i, j)| self.city_tile_value(city, i, j))
            .max()
            .unwrap_or(0)
    }

    // === Settlement siting ===

    /// True if some settlement other than one at `(x, y)` itself lies
    /// within the workable radius of `(x, y)`
    pub fn city_exists_within_radius(&self, x: i32, y: i32) -> bool {
        for dy in -WORK_RADIUS..=WORK_RADIUS {
            for dx in -WORK_RADIUS..=WORK_RADIUS {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if !delta_in_radius(dx, dy) {
                    continue;
                }
                if self.city_at(x + dx, y + dy).is_some() {
                    return true;
                }
            }
        }
        false
    }

    /// Spacing and terrain legality for a new settlement site
    pub fn is_ok_city_spot(&self, x: i32, y: i32) -> bool {
        if !self.map.is_legal_city_terrain(x, y) {
            return false;
        }
        let Some(pos) = self.map.normalize(x, y) else {
            return false;
        };
        let min_dist = self.config.min_city_distance;
        for city in &self.cities {
            if self.map.distance(pos, city.pos) > 8 {
                continue;
            }
            let dx = self.map.dx(pos.x, city.pos.x);
            let dy = (pos.y - city.pos.y).abs();
            // heuristic spacing first, then the rule-mandated minimum
            if (dx <= 5 && dy < 5) || (dx < 5 && dy <= 5) {
                return false;
            }
            if dx < min_dist && dy < min_dist {
                return false;
            }
        }
        true
    }

    /// Founding precondition for the automated scan: on-map land with no
    /// settlement on the tile. The picky site screen is opt-in; any land
    /// tile qualifies by default.
    pub fn can_found_at(&self, x: i32, y: i32) -> bool {
        match self.map.terrain(x, y) {
            Some(terrain) if !terrain.is_water() => {}
            _ => return false,
        }
        if self.city_at(x, y).is_some() {
            return false;
        }
        !self.config.strict_site_terrain || self.is_ok_city_spot(x, y)
    }

    // === Command sink ===

    pub fn set_activity(&mut self, id: UnitId, activity: Activity) {
        if let Some(unit) = self.unit_mut(id) {
            unit.activity = activity;
            if activity != Activity::Travel {
                unit.travel_target = None;
            }
        }
    }

    /// Queue a multi-turn travel order. Off-map destinations are rejected
    /// and leave the unit untouched.
    pub fn order_travel(&mut self, id: UnitId, x: i32, y: i32) {
        let Some(dest) = self.map.normalize(x, y) else {
            tracing::debug!("travel order to off-map ({}, {}) dropped", x, y);
            return;
        };
        if let Some(unit) = self.unit_mut(id) {
            unit.travel_target = Some(dest);
            unit.activity = Activity::Travel;
        }
    }

    /// Move a unit, spending `cost` move points. Returns false if the unit
    /// was destroyed on arrival (fatal tile).
    pub fn move_unit(&mut self, id: UnitId, x: i32, y: i32, cost: u32) -> bool {
        let Some(dest) = self.map.normalize(x, y) else {
            return true;
        };
        let fatal = self.fatal_tiles.contains(&(dest.x, dest.y));
        if let Some(unit) = self.unit_mut(id) {
            unit.pos = dest;
            unit.moves_left = unit.moves_left.saturating_sub(cost);
            if fatal {
                tracing::debug!(unit = id.0, x = dest.x, y = dest.y, "unit lost entering fatal tile");
                self.destroy_unit(id);
                return false;
            }
        }
        true
    }

    /// Stand-in for the external travel engine finishing an order: the unit
    /// arrives at its destination and goes idle. Returns false if it died
    /// on arrival.
    pub fn complete_travel(&mut self, id: UnitId) -> bool {
        let Some(unit) = self.unit(id) else {
            return false;
        };
        let Some(dest) = unit.travel_target else {
            return true;
        };
        if !self.move_unit(id, dest.x, dest.y, 0) {
            return false;
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.travel_target = None;
            unit.activity = Activity::Idle;
        }
        true
    }

    /// Found a settlement at the unit's position, consuming the unit
    pub fn found_city(&mut self, id: UnitId) -> Result<CityId> {
        let unit = self.unit(id).ok_or(HomesteadError::UnitNotFound(id))?;
        let (owner, pos) = (unit.owner, unit.pos);
        if !unit.can_found() {
            return Err(HomesteadError::IllegalSite {
                x: pos.x,
                y: pos.y,
                reason: format!("{} cannot found settlements", unit.kind.spec().name),
            });
        }
        if self.city_at(pos.x, pos.y).is_some()
            || self
                .map
                .terrain(pos.x, pos.y)
                .map_or(true, |terrain| terrain.is_water())
        {
            return Err(HomesteadError::IllegalSite {
                x: pos.x,
                y: pos.y,
                reason: "tile cannot host a settlement".into(),
            });
        }

        self.destroy_unit(id);
        let city_id = CityId(self.next_city_id);
        self.next_city_id += 1;
        let city = City::new(city_id, owner, pos);
        self.city_index.insert(city_id, self.cities.len());
        self.cities.push(city);
        self.mark_overlaps(city_id);
        tracing::debug!(city = city_id.0, x = pos.x, y = pos.y, "settlement founded");
        Ok(city_id)
    }

    /// Mark workable offsets contested between the new settlement and its
    /// neighbors as unavailable, both ways
    fn mark_overlaps(&mut self, new_id: CityId) {
        let new_pos = match self.city(new_id) {
            Some(city) => city.pos,
            None => return,
        };
        let mut blocked_new: Vec<(usize, usize)> = Vec::new();
        for city in &mut self.cities {
            if city.id == new_id {
                continue;
            }
            for (i, j) in work_offsets() {
                let (x, y) = city.offset_pos(i, j);
                if x == new_pos.x && y == new_pos.y {
                    city.worked[i][j] = WorkStatus::Unavailable;
                }
            }
        }
        for (i, j) in work_offsets() {
            let (x, y) = (new_pos.x + i as i32 - 2, new_pos.y + j as i32 - 2);
            if (i, j) != (2, 2) && self.city_at(x, y).is_some() {
                blocked_new.push((i, j));
            }
        }
        if let Some(city) = self.city_mut(new_id) {
            for (i, j) in blocked_new {
                city.worked[i][j] = WorkStatus::Unavailable;
            }
        }
    }

    /// Debug snapshot of the whole state
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::terrain::Terrain;

    fn flat_state() -> GameState {
        let mut map = GameMap::filled(20, 20, Terrain::Grassland);
        map.assign_continents();
        GameState::new(map, EngineConfig::default())
    }

    #[test]
    fn test_found_city_consumes_unit() {
        let mut state = flat_state();
        let player = state.add_player("alpha");
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
        let city = state.found_city(settler).unwrap();
        assert!(state.unit(settler).is_none());
        assert_eq!(state.city(city).unwrap().pos, Pos::new(5, 5));
    }

    #[test]
    fn test_found_city_rejects_water() {
        let mut state = flat_state();
        state.map.set_terrain(5, 5, Terrain::Ocean);
        let player = state.add_player("alpha");
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
        assert!(state.found_city(settler).is_err());
        // the unit survives a rejected order
        assert!(state.unit(settler).is_some());
    }

    #[test]
    fn test_spacing_rejects_close_sites() {
        let mut state = flat_state();
        let player = state.add_player("alpha");
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
        state.found_city(settler).unwrap();
        assert!(!state.is_ok_city_spot(7, 5));
        assert!(state.is_ok_city_spot(12, 12));
    }

    #[test]
    fn test_rough_terrain_is_foundable_unless_strict() {
        let mut state = flat_state();
        state.map.set_terrain(12, 12, Terrain::Hills);
        assert!(state.can_found_at(12, 12));
        state.config.strict_site_terrain = true;
        assert!(!state.can_found_at(12, 12));
    }

    #[test]
    fn test_fatal_tile_destroys_moving_unit() {
        let mut state = flat_state();
        let player = state.add_player("alpha");
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
        state.fatal_tiles.insert((6, 5));
        assert!(!state.move_unit(settler, 6, 5, 3));
        assert!(state.unit(settler).is_none());
    }

    #[test]
    fn test_mine_raises_weighted_value() {
        let mut state = flat_state();
        let player = state.add_player("alpha");
        state.map.set_terrain(6, 5, Terrain::Hills);
        let settler = state.spawn_unit(player, UnitKind::Settlers, Pos::new(5, 5));
        let city_id = state.found_city(settler).unwrap();
        let city = state.city(city_id).unwrap().clone();
        let bare = state.city_tile_value(&city, 3, 2);
        let tile = *state.map.tile(6, 5).unwrap();
        let mined = state
            .city_tile_value_with(&city, tile.overridden(tile.terrain, tile.features.with(Features::MINE)));
        assert!(mined > bare);
    }

    #[test]
    fn test_hazard_halves_yields() {
        let state = flat_state();
        let tech = TechFlags::default();
        let clean = Tile::new(Terrain::Grassland);
        let dirty = clean.overridden(clean.terrain, clean.features.with(Features::POLLUTION));
        assert!(state.tile_yields(&dirty, tech).food < state.tile_yields(&clean, tech).food);
    }
}
