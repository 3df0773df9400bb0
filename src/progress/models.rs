use serde::{Deserialize, Serialize};
use std::fmt;

use crate::level::GameKind;

/// Durable identity of one progression record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub student_id: String,
    pub kind: GameKind,
}

impl ProgressKey {
    pub fn new(student_id: &str, kind: GameKind) -> Self {
        Self {
            student_id: student_id.to_string(),
            kind,
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "progress:{}:{}", self.student_id, self.kind)
    }
}

/// Per-student, per-game record of current, completed and unlocked levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub student_id: String,
    pub game_kind: GameKind,
    pub level_sequence: Vec<String>,
    pub current_level: String,
    pub completed_levels: Vec<String>,
    pub unlocked_levels: Vec<String>,
}

impl StudentProgress {
    /// A fresh record sitting on the first level. `sequence` must be non-empty.
    pub fn first_level(student_id: &str, game_kind: GameKind, sequence: &[String]) -> Option<Self> {
        let first = sequence.first()?.clone();
        Some(Self {
            student_id: student_id.to_string(),
            game_kind,
            level_sequence: sequence.to_vec(),
            current_level: first.clone(),
            completed_levels: vec![],
            unlocked_levels: vec![first],
        })
    }

    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(&self.student_id, self.game_kind)
    }

    pub fn is_unlocked(&self, level_id: &str) -> bool {
        self.unlocked_levels.iter().any(|level| level == level_id)
    }

    pub fn is_completed(&self, level_id: &str) -> bool {
        self.completed_levels.iter().any(|level| level == level_id)
    }

    /// Checks the invariants a stored record has to satisfy to be trusted
    pub fn is_consistent(&self) -> bool {
        let Some(first) = self.level_sequence.first() else {
            return false;
        };
        self.is_unlocked(first)
            && self.is_unlocked(&self.current_level)
            && self
                .unlocked_levels
                .iter()
                .chain(self.completed_levels.iter())
                .all(|level| self.level_sequence.contains(level))
    }

    pub(crate) fn mark_completed(&mut self, level_id: &str) {
        if !self.is_completed(level_id) {
            self.completed_levels.push(level_id.to_string());
        }
    }

    pub(crate) fn unlock_and_enter(&mut self, level_id: &str) {
        if !self.is_unlocked(level_id) {
            self.unlocked_levels.push(level_id.to_string());
        }
        self.current_level = level_id.to_string();
    }

    pub(crate) fn next_after(&self, level_id: &str) -> Option<String> {
        let position = self.level_sequence.iter().position(|l| l == level_id)?;
        self.level_sequence.get(position + 1).cloned()
    }
}
