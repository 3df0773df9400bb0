use std::sync::Arc;

use classroom_games::{
    game::FixedShuffler,
    level::{InMemoryLevelResolver, LevelDefinition},
    progress::{InMemoryProgressStore, ProgressStore, ProgressTracker},
    report::{InMemoryResultSink, ResultReporter, ResultSink},
    GameConfig, GameContext, ManualScheduler, Student,
};

pub const STUDENT: &str = "student-1";
pub const GRADE: &str = "3";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub ctx: GameContext,
    pub scheduler: Arc<ManualScheduler>,
    pub tracker: Arc<ProgressTracker>,
    pub sink: InMemoryResultSink,
    pub reporter: ResultReporter,
}

pub struct TestSetupBuilder {
    levels: Vec<LevelDefinition>,
    shuffle: Vec<usize>,
    config: GameConfig,
    store: Option<Arc<dyn ProgressStore>>,
    sink: Option<Arc<dyn ResultSink>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            levels: vec![],
            shuffle: vec![],
            config: GameConfig::default(),
            store: None,
            sink: None,
        }
    }

    pub fn with_level(mut self, level: LevelDefinition) -> Self {
        self.levels.push(level);
        self
    }

    /// Fixed layout order; anything that is not a permutation of the right
    /// length leaves items in authored order
    pub fn with_shuffle(mut self, order: Vec<usize>) -> Self {
        self.shuffle = order;
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ProgressStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Must be called inside a tokio runtime, the reporter spawns its task
    pub fn build(self) -> TestSetup {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryProgressStore::new()));
        let tracker = Arc::new(ProgressTracker::new(store, self.config.sequences.clone()));
        let sink = InMemoryResultSink::new();
        let reporter =
            ResultReporter::spawn(self.sink.unwrap_or_else(|| Arc::new(sink.clone())));

        let ctx = GameContext::new(
            Student::new(STUDENT, GRADE),
            Arc::new(InMemoryLevelResolver::with_levels(self.levels)),
            tracker.clone(),
            reporter.clone(),
            scheduler.clone(),
            self.config,
        )
        .with_shuffler(Arc::new(FixedShuffler::new(self.shuffle)));

        TestSetup {
            ctx,
            scheduler,
            tracker,
            sink,
            reporter,
        }
    }
}
