use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The three mini-games a level can be authored for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    Puzzle,
    Memory,
    Riddle,
}

/// The identity an engine plays for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub grade: String,
}

impl Student {
    pub fn new(id: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            grade: grade.into(),
        }
    }
}

/// Instructor-authored configuration for one difficulty tier of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub active: bool,
    pub params: LevelParams,
}

impl LevelDefinition {
    pub fn kind(&self) -> GameKind {
        self.params.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LevelParams {
    Puzzle(PuzzleParams),
    Memory(MemoryParams),
    Riddle(RiddleParams),
}

impl LevelParams {
    pub fn kind(&self) -> GameKind {
        match self {
            LevelParams::Puzzle(_) => GameKind::Puzzle,
            LevelParams::Memory(_) => GameKind::Memory,
            LevelParams::Riddle(_) => GameKind::Riddle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleParams {
    pub rows: u32,
    pub cols: u32,
    /// Seconds, 0 means unlimited
    pub time_limit: u32,
    pub image: String,
}

impl PuzzleParams {
    pub fn piece_count(&self) -> usize {
        (self.rows * self.cols) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryParams {
    pub pair_count: u32,
    /// Seconds, 0 means unlimited
    pub time_limit: u32,
    /// Pair comparisons allowed, 0 means unlimited
    pub attempt_limit: u32,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiddleWord {
    pub word: String,
    pub hint: Option<String>,
}

impl RiddleWord {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            hint: None,
        }
    }

    pub fn with_hint(word: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            hint: Some(hint.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiddleParams {
    pub words: Vec<RiddleWord>,
    pub words_per_round: u32,
    pub max_incorrect_per_word: u32,
    /// Seconds for the whole round, 0 means unlimited
    pub round_time_limit: u32,
}
