use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::level::GameKind;

pub const SETTLE_DELAY_ENV: &str = "CLASSROOM_GAMES_SETTLE_DELAY_MS";
pub const FEEDBACK_DELAY_ENV: &str = "CLASSROOM_GAMES_FEEDBACK_DELAY_MS";
pub const SEQUENCE_END_ENV: &str = "CLASSROOM_GAMES_SEQUENCE_END";

const DEFAULT_SEQUENCE_LENGTH: usize = 5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Level sequence for {0} must not be empty")]
    EmptySequence(GameKind),
}

/// What happens when a student completes the last level of a sequence
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SequenceEndPolicy {
    /// Stay on the last level
    #[default]
    Stop,
    /// Send the student back to the first level, keeping what was completed
    Loop,
}

/// Fixed, ordered progression level ids per game kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSequences {
    sequences: HashMap<GameKind, Vec<String>>,
}

impl Default for LevelSequences {
    fn default() -> Self {
        let sequences = GameKind::iter()
            .map(|kind| {
                let levels = (1..=DEFAULT_SEQUENCE_LENGTH)
                    .map(|n| format!("level-{}", n))
                    .collect();
                (kind, levels)
            })
            .collect();
        Self { sequences }
    }
}

impl LevelSequences {
    pub fn with_sequence(
        mut self,
        kind: GameKind,
        levels: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptySequence(kind));
        }
        self.sequences.insert(kind, levels);
        Ok(self)
    }

    pub fn sequence(&self, kind: GameKind) -> &[String] {
        self.sequences
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first(&self, kind: GameKind) -> Option<&str> {
        self.sequence(kind).first().map(String::as_str)
    }

    /// The entry after `level_id`, or `None` at the end or for an unknown id
    pub fn next_after(&self, kind: GameKind, level_id: &str) -> Option<&str> {
        let sequence = self.sequence(kind);
        let position = sequence.iter().position(|level| level == level_id)?;
        sequence.get(position + 1).map(String::as_str)
    }

    pub fn contains(&self, kind: GameKind, level_id: &str) -> bool {
        self.sequence(kind).iter().any(|level| level == level_id)
    }
}

/// Runtime configuration shared by every engine
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// How long a mismatched memory pair stays face up
    pub settle_delay: Duration,
    /// How long a finished riddle word stays on screen before the next one
    pub feedback_delay: Duration,
    /// Countdown resolution
    pub tick_period: Duration,
    pub sequence_end: SequenceEndPolicy,
    pub sequences: LevelSequences,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            feedback_delay: Duration::from_millis(1500),
            tick_period: Duration::from_secs(1),
            sequence_end: SequenceEndPolicy::Stop,
            sequences: LevelSequences::default(),
        }
    }
}

impl GameConfig {
    /// Defaults overridden by any `CLASSROOM_GAMES_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(SETTLE_DELAY_ENV) {
            config.settle_delay = parse_millis(SETTLE_DELAY_ENV, &value)?;
        }
        if let Some(value) = lookup(FEEDBACK_DELAY_ENV) {
            config.feedback_delay = parse_millis(FEEDBACK_DELAY_ENV, &value)?;
        }
        if let Some(value) = lookup(SEQUENCE_END_ENV) {
            config.sequence_end =
                SequenceEndPolicy::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                    key: SEQUENCE_END_ENV.to_string(),
                    value,
                })?;
        }

        Ok(config)
    }

    pub fn with_sequence_end(mut self, policy: SequenceEndPolicy) -> Self {
        self.sequence_end = policy;
        self
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
