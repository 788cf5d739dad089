//! The valuation and assignment engine

pub mod desirability;
pub mod discount;
pub mod driver;
pub mod goals;
pub mod improvements;
pub mod territory;
pub mod travel;

pub use desirability::SiteGrid;
pub use discount::{discount, MORT};
pub use driver::{probe_city_wants, run_turn, EngineGrids};
pub use goals::{find_work, probe_want};
pub use territory::{ClaimGrid, TerritoryGrid};
pub use travel::{TravelCosts, Warmap};
