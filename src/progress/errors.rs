use thiserror::Error;

use crate::level::GameKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Level {level_id} is not part of the {kind} sequence")]
    UnknownLevel { kind: GameKind, level_id: String },

    #[error("No level sequence configured for {0}")]
    EmptySequence(GameKind),
}
