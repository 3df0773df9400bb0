use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, GameConfig};
use crate::game::{GameError, RandomShuffler, Shuffler};
use crate::level::{GameKind, LevelResolver, ResolveError, Student};
use crate::progress::{ProgressError, ProgressTracker};
use crate::report::{ReportError, ResultReporter};
use crate::scheduler::Scheduler;

/// Everything an engine needs from the outside world
#[derive(Clone)]
pub struct GameContext {
    pub student: Student,
    pub resolver: Arc<dyn LevelResolver>,
    pub tracker: Arc<ProgressTracker>,
    pub reporter: ResultReporter,
    pub scheduler: Arc<dyn Scheduler>,
    pub shuffler: Arc<dyn Shuffler>,
    pub config: GameConfig,
}

impl GameContext {
    pub fn new(
        student: Student,
        resolver: Arc<dyn LevelResolver>,
        tracker: Arc<ProgressTracker>,
        reporter: ResultReporter,
        scheduler: Arc<dyn Scheduler>,
        config: GameConfig,
    ) -> Self {
        Self {
            student,
            resolver,
            tracker,
            reporter,
            scheduler,
            shuffler: Arc::new(RandomShuffler),
            config,
        }
    }

    pub fn with_shuffler(mut self, shuffler: Arc<dyn Shuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }
}

/// Non-blocking message shown to the player alongside the game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum Notice {
    /// No active level for the grade; a built-in configuration is in use
    ConfigurationMissing(GameKind),
    PersistenceFailure(String),
    InvalidLevelContent(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Level resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Game driver has stopped")]
    DriverStopped,
}
