//! Hard-coded configurations used when no level is active for a grade.

use super::models::{MemoryParams, PuzzleParams};

pub const DEFAULT_PUZZLE_IMAGE: &str = "default-puzzle";

pub fn puzzle() -> PuzzleParams {
    PuzzleParams {
        rows: 3,
        cols: 3,
        time_limit: 180,
        image: DEFAULT_PUZZLE_IMAGE.to_string(),
    }
}

pub fn memory() -> MemoryParams {
    MemoryParams {
        pair_count: 6,
        time_limit: 120,
        attempt_limit: 0,
        images: (1..=6).map(|n| format!("card-{}", n)).collect(),
    }
}
