//! Settlements and their workable grids
//!
//! Every settlement works a fixed 5×5 neighborhood (minus the four
//! corners). Offsets into that grid are `(i, j)` in `0..5`, with the
//! settlement itself at (2, 2).

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, PlayerId, Pos};

/// Side length of the workable grid
pub const WORK_GRID: usize = 5;
/// Workable radius in tiles
pub const WORK_RADIUS: i32 = 2;

/// One layer of cached improvement values over the workable grid
pub type CacheGrid = [[i32; WORK_GRID]; WORK_GRID];

/// Sentinel for "improvement not applicable at this offset"
pub const NOT_APPLICABLE: i32 = -1;

/// Assignment state of one workable offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkStatus {
    /// Free for a citizen (or a settler improvement)
    Empty,
    /// Worked by one of this settlement's citizens
    Worker,
    /// Claimed by another settlement or blocked by an enemy
    Unavailable,
}

impl Default for WorkStatus {
    fn default() -> Self {
        Self::Empty
    }
}

/// Cached marginal value of every improvement at every workable offset
///
/// Recomputed wholesale by `engine::improvements::refresh`; the probes are
/// nonlinear in several tile attributes at once, so the cache is never
/// patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementCache {
    pub irrigate: CacheGrid,
    pub transform: CacheGrid,
    pub mine: CacheGrid,
    pub road: CacheGrid,
    pub railroad: CacheGrid,
    pub clean_pollution: CacheGrid,
    pub clean_fallout: CacheGrid,
}

impl Default for ImprovementCache {
    fn default() -> Self {
        let empty = [[NOT_APPLICABLE; WORK_GRID]; WORK_GRID];
        Self {
            irrigate: empty,
            transform: empty,
            mine: empty,
            road: empty,
            railroad: empty,
            clean_pollution: empty,
            clean_fallout: empty,
        }
    }
}

/// A settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub owner: PlayerId,
    pub pos: Pos,
    /// Population size; drives food weighting and the immigration cap
    pub size: u8,
    /// Citizen assignment over the workable grid
    pub worked: [[WorkStatus; WORK_GRID]; WORK_GRID],
    /// Food stockpile effect: halves the cost proxy of producing a settler
    pub has_granary: bool,
    pub cache: ImprovementCache,
    /// Want values written back by the virtual-unit probes, consumed by the
    /// external production scheduler
    pub settler_want: i32,
    pub founder_want: i32,
    /// Positive when a founding want exists that needs a ferry built first
    pub ferry_want: i32,
}

impl City {
    pub fn new(id: CityId, owner: PlayerId, pos: Pos) -> Self {
        let mut worked = [[WorkStatus::Empty; WORK_GRID]; WORK_GRID];
        worked[2][2] = WorkStatus::Worker;
        Self {
            id,
            owner,
            pos,
            size: 1,
            worked,
            has_granary: false,
            cache: ImprovementCache::default(),
            settler_want: 0,
            founder_want: 0,
            ferry_want: 0,
        }
    }

    /// Map coordinates of a workable offset (not yet normalized)
    pub fn offset_pos(&self, i: usize, j: usize) -> (i32, i32) {
        (
            self.pos.x + i as i32 - WORK_RADIUS,
            self.pos.y + j as i32 - WORK_RADIUS,
        )
    }

    pub fn status(&self, i: usize, j: usize) -> WorkStatus {
        self.worked[i][j]
    }

    pub fn set_status(&mut self, i: usize, j: usize, status: WorkStatus) {
        self.worked[i][j] = status;
    }
}

/// Whether `(i, j)` lies inside the workable shape (5×5 minus corners)
pub fn in_work_grid(i: i32, j: i32) -> bool {
    if !(0..WORK_GRID as i32).contains(&i) || !(0..WORK_GRID as i32).contains(&j) {
        return false;
    }
    let (di, dj) = (i - WORK_RADIUS, j - WORK_RADIUS);
    !(di.abs() == WORK_RADIUS && dj.abs() == WORK_RADIUS)
}

/// All workable offsets, row-major
pub fn work_offsets() -> impl Iterator<Item = (usize, usize)> {
    (0..WORK_GRID)
        .flat_map(|i| (0..WORK_GRID).map(move |j| (i, j)))
        .filter(|&(i, j)| in_work_grid(i as i32, j as i32))
}

/// Whether a map delta from a settlement falls inside its workable shape
pub fn delta_in_radius(dx: i32, dy: i32) -> bool {
    in_work_grid(dx + WORK_RADIUS, dy + WORK_RADIUS)
}
