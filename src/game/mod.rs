//! Players, units, settlements, and the shared game state

pub mod city;
pub mod player;
pub mod state;
pub mod unit;

pub use city::{City, WorkStatus};
pub use player::Player;
pub use state::GameState;
pub use unit::{Activity, Unit, UnitKind, UnitRole};
