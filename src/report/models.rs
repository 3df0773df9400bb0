use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::GameKind;
use crate::scoring::Rating;

/// Terminal outcome of one play, written once and handed to the result sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: Uuid,
    pub student_id: String,
    pub game_kind: GameKind,
    pub level_id: String,
    pub score: u32,
    pub stars: u8,
    pub completed: bool,
    pub metrics: GameMetrics,
    pub completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn new(
        student_id: &str,
        level_id: &str,
        rating: Rating,
        completed: bool,
        metrics: GameMetrics,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: student_id.to_string(),
            game_kind: metrics.kind(),
            level_id: level_id.to_string(),
            score: rating.score,
            stars: rating.stars,
            completed,
            metrics,
            completed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameMetrics {
    Puzzle {
        moves: u32,
        /// Seconds, absent when the level had no time limit
        time_used: Option<u32>,
    },
    Memory {
        matched_pairs: u32,
        attempts_used: u32,
        time_used: Option<u32>,
    },
    Riddle {
        words_guessed: u32,
        total_incorrect: u32,
    },
}

impl GameMetrics {
    pub fn kind(&self) -> GameKind {
        match self {
            GameMetrics::Puzzle { .. } => GameKind::Puzzle,
            GameMetrics::Memory { .. } => GameKind::Memory,
            GameMetrics::Riddle { .. } => GameKind::Riddle,
        }
    }
}
