// Library crate for the classroom mini-games
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod game;
pub mod level;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use config::{GameConfig, LevelSequences, SequenceEndPolicy};
pub use game::{
    DriverHandle, GameDriver, GameEngine, GameError, MemoryEngine, PuzzleEngine, RiddleEngine,
};
pub use level::{GameKind, LevelDefinition, LevelResolver, Student};
pub use progress::{ProgressStore, ProgressTracker, StudentProgress};
pub use report::{GameResult, ResultReporter, ResultSink};
pub use scheduler::{ManualScheduler, Scheduler, TimerId, TokioScheduler};
pub use scoring::Rating;
pub use shared::{AppError, GameContext, Notice};
