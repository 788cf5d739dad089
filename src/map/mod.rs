//! Tile/terrain data model consumed by the engine

pub mod grid;
pub mod terrain;
pub mod tile;

pub use grid::{CellGrid, GameMap};
pub use terrain::Terrain;
pub use tile::{Features, Tile};
