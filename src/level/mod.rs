pub mod defaults;
pub mod models;
pub mod resolver;

pub use models::{
    GameKind, LevelDefinition, LevelParams, MemoryParams, PuzzleParams, RiddleParams, RiddleWord,
    Student,
};
pub use resolver::{InMemoryLevelResolver, LevelResolver, ResolveError};
