//! Pure scoring and star-rating rules, one per game.

mod memory;
mod puzzle;
mod riddle;

use serde::{Deserialize, Serialize};

pub use memory::{memory_rating, MemoryMetrics};
pub use puzzle::{puzzle_rating, PuzzleMetrics};
pub use riddle::{riddle_rating, RiddleMetrics};

/// Highest numeric score any game awards
pub const MAX_SCORE: u32 = 20;
pub const MAX_STARS: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub score: u32,
    pub stars: u8,
}

impl Rating {
    pub const ZERO: Rating = Rating { score: 0, stars: 0 };

    pub fn new(score: u32, stars: u8) -> Self {
        Self {
            score,
            stars: stars.min(MAX_STARS),
        }
    }
}

/// `part / whole` as a fraction, treating a zero `whole` as nothing achieved
fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
