//! Map storage and coordinate arithmetic
//!
//! The map wraps east-west; `y` is clamped. Every public query goes through
//! `normalize`, which fails closed: an off-map coordinate is simply not a
//! tile, never a wrapped-around one.

use serde::{Deserialize, Serialize};

use crate::core::types::{Continent, Pos};
use crate::map::terrain::Terrain;
use crate::map::tile::{Features, Tile};

/// The world map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl GameMap {
    /// Create a map filled with a single terrain
    pub fn filled(width: i32, height: i32, terrain: Terrain) -> Self {
        assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            tiles: vec![Tile::new(terrain); (width * height) as usize],
        }
    }

    /// Build a map from rows of terrain; rows must be equal length
    pub fn from_rows(rows: &[Vec<Terrain>]) -> Self {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let mut map = Self::filled(width, height, Terrain::Ocean);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len() as i32, width);
            for (x, &terrain) in row.iter().enumerate() {
                map.tiles[y * row.len() + x] = Tile::new(terrain);
            }
        }
        map.assign_continents();
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Wrap `x` east-west and reject off-map `y`. All invalid coordinates
    /// come back as `None`.
    pub fn normalize(&self, x: i32, y: i32) -> Option<Pos> {
        if y < 0 || y >= self.height {
            return None;
        }
        Some(Pos::new(x.rem_euclid(self.width), y))
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.normalize(x, y).map(|pos| &self.tiles[self.index(pos)])
    }

    pub fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        let pos = self.normalize(x, y)?;
        let idx = self.index(pos);
        Some(&mut self.tiles[idx])
    }

    pub fn terrain(&self, x: i32, y: i32) -> Option<Terrain> {
        self.tile(x, y).map(|tile| tile.terrain)
    }

    pub fn continent(&self, x: i32, y: i32) -> Option<Continent> {
        self.tile(x, y).map(|tile| tile.continent)
    }

    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: Terrain) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.terrain = terrain;
        }
    }

    pub fn set_features(&mut self, x: i32, y: i32, features: Features) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.features = features;
        }
    }

    pub fn add_feature(&mut self, x: i32, y: i32, feature: Features) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.features.set(feature);
        }
    }

    /// The eight neighbors of a cell, on-map ones only
    pub fn neighbors(&self, x: i32, y: i32) -> impl Iterator<Item = Pos> + '_ {
        const OFFSETS: [(i32, i32); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.normalize(x + dx, y + dy))
    }

    /// True if any adjacent cell is water
    pub fn is_water_adjacent(&self, x: i32, y: i32) -> bool {
        self.neighbors(x, y)
            .any(|pos| self.tiles[self.index(pos)].terrain.is_water())
    }

    /// East-west distance honoring the wrap
    pub fn dx(&self, x1: i32, x2: i32) -> i32 {
        let a = x1.rem_euclid(self.width);
        let b = x2.rem_euclid(self.width);
        let d = (a - b).abs();
        d.min(self.width - d)
    }

    /// Chebyshev distance honoring the east-west wrap
    pub fn distance(&self, a: Pos, b: Pos) -> i32 {
        self.dx(a.x, b.x).max((a.y - b.y).abs())
    }

    /// Number of land tiles, for hazard-pressure scaling
    pub fn land_tiles(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| !tile.terrain.is_water())
            .count()
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Flood-fill continent ids over connected land. Water keeps id 0.
    pub fn assign_continents(&mut self) {
        for tile in &mut self.tiles {
            tile.continent = 0;
        }
        let mut next: Continent = 1;
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Pos::new(x, y);
                let idx = self.index(pos);
                if self.tiles[idx].terrain.is_water() || self.tiles[idx].continent != 0 {
                    continue;
                }
                let mut stack = vec![pos];
                self.tiles[idx].continent = next;
                while let Some(cur) = stack.pop() {
                    let neighbors: Vec<Pos> = self.neighbors(cur.x, cur.y).collect();
                    for npos in neighbors {
                        let nidx = self.index(npos);
                        if !self.tiles[nidx].terrain.is_water() && self.tiles[nidx].continent == 0 {
                            self.tiles[nidx].continent = next;
                            stack.push(npos);
                        }
                    }
                }
                next += 1;
            }
        }
    }

    /// Terrain legality for founding a settlement. Deserts need a special
    /// resource; rough terrain never qualifies.
    pub fn is_legal_city_terrain(&self, x: i32, y: i32) -> bool {
        let Some(tile) = self.tile(x, y) else {
            return false;
        };
        if tile.terrain.allows_city_without_resource() {
            return true;
        }
        tile.terrain == Terrain::Desert && tile.features.has(Features::RESOURCE)
    }
}

/// A dense per-cell scalar grid sharing the map's coordinate rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGrid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T: Copy + Default> CellGrid<T> {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); (width * height) as usize],
        }
    }

    pub fn matching(map: &GameMap) -> Self {
        Self::new(map.width(), map.height())
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    fn normalize(&self, x: i32, y: i32) -> Option<usize> {
        if y < 0 || y >= self.height {
            return None;
        }
        Some((y * self.width + x.rem_euclid(self.width)) as usize)
    }

    /// Off-map reads return the default value; writes to off-map cells are
    /// dropped. Both directions fail closed.
    pub fn get(&self, x: i32, y: i32) -> T {
        self.normalize(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or_default()
    }

    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(idx) = self.normalize(x, y) {
            self.cells[idx] = value;
        }
    }

    pub fn update(&mut self, x: i32, y: i32, f: impl FnOnce(T) -> T) {
        if let Some(idx) = self.normalize(x, y) {
            self.cells[idx] = f(self.cells[idx]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_wraps_y_fails_closed() {
        let map = GameMap::filled(10, 6, Terrain::Grassland);
        assert_eq!(map.normalize(-1, 2), Some(Pos::new(9, 2)));
        assert_eq!(map.normalize(12, 2), Some(Pos::new(2, 2)));
        assert_eq!(map.normalize(3, -1), None);
        assert_eq!(map.normalize(3, 6), None);
    }

    #[test]
    fn test_wrapped_distance() {
        let map = GameMap::filled(10, 10, Terrain::Grassland);
        assert_eq!(map.distance(Pos::new(0, 0), Pos::new(9, 0)), 1);
        assert_eq!(map.distance(Pos::new(2, 2), Pos::new(5, 1)), 3);
    }

    #[test]
    fn test_continent_assignment_splits_on_water() {
        use Terrain::*;
        // ocean on both edges so the east-west wrap cannot join the landmasses
        let map = GameMap::from_rows(&[
            vec![Ocean, Grassland, Ocean, Plains, Ocean],
            vec![Ocean, Grassland, Ocean, Plains, Ocean],
        ]);
        let left = map.continent(1, 0).unwrap();
        let right = map.continent(3, 0).unwrap();
        assert_ne!(left, 0);
        assert_ne!(right, 0);
        assert_ne!(left, right);
        assert_eq!(map.continent(2, 0).unwrap(), 0);
    }

    #[test]
    fn test_cell_grid_fails_closed() {
        let mut grid: CellGrid<i32> = CellGrid::new(4, 4);
        grid.set(1, 5, 7); // dropped
        assert_eq!(grid.get(1, 5), 0);
        grid.set(-1, 1, 9); // wraps east-west like the map
        assert_eq!(grid.get(3, 1), 9);
    }
}
