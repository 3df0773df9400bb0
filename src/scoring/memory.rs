use super::{Rating, MAX_SCORE};

const BASE_SCORE: u32 = 10;
const FULL_BONUS: u32 = 5;
const PARTIAL_BONUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMetrics {
    pub all_matched: bool,
    /// 0 means unlimited
    pub attempt_limit: u32,
    pub attempts_used: u32,
    /// Seconds, 0 means unlimited
    pub time_limit: u32,
    pub time_left: u32,
}

pub fn memory_rating(metrics: &MemoryMetrics) -> Rating {
    if !metrics.all_matched {
        return Rating::ZERO;
    }

    let mut score = BASE_SCORE;

    if metrics.attempt_limit > 0 {
        let used = metrics.attempts_used as f64;
        let limit = metrics.attempt_limit as f64;
        if used <= limit / 2.0 {
            score += FULL_BONUS;
        } else if used <= limit * 0.75 {
            score += PARTIAL_BONUS;
        }
    }

    if metrics.time_limit > 0 {
        let left = super::ratio(metrics.time_left, metrics.time_limit);
        if left >= 0.5 {
            score += FULL_BONUS;
        } else if left >= 0.25 {
            score += PARTIAL_BONUS;
        }
    }

    let score = score.min(MAX_SCORE);
    Rating::new(score, stars_for(score))
}

fn stars_for(score: u32) -> u8 {
    match score {
        15.. => 3,
        10..=14 => 2,
        5..=9 => 1,
        _ => 0,
    }
}
