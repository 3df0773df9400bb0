use super::{Rating, MAX_SCORE};

const TIME_WEIGHT: f64 = 0.7;
const MOVES_WEIGHT: f64 = 0.3;
/// Moves allowed per piece before the moves factor bottoms out
const MOVES_PER_PIECE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleMetrics {
    pub won: bool,
    pub rows: u32,
    pub cols: u32,
    pub moves: u32,
    /// Seconds, 0 means unlimited
    pub time_limit: u32,
    pub time_left: u32,
}

pub fn puzzle_rating(metrics: &PuzzleMetrics) -> Rating {
    if !metrics.won {
        return Rating::ZERO;
    }

    let unlimited = metrics.time_limit == 0;
    let time_factor = if unlimited {
        1.0
    } else {
        super::ratio(metrics.time_left, metrics.time_limit)
    };

    let move_budget = metrics.rows * metrics.cols * MOVES_PER_PIECE;
    let moves_factor = if move_budget == 0 {
        1.0
    } else {
        1.0 - (metrics.moves as f64 / move_budget as f64).min(1.0)
    };

    let raw_score = (TIME_WEIGHT * time_factor + MOVES_WEIGHT * moves_factor) * MAX_SCORE as f64;
    let score = raw_score.clamp(0.0, MAX_SCORE as f64).round() as u32;

    let stars = if unlimited || time_factor >= 0.66 {
        3
    } else if time_factor >= 0.33 {
        2
    } else {
        1
    };

    Rating::new(score, stars)
}
