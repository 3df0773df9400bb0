use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::models::{GameKind, LevelDefinition};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No active {kind} level for grade {grade}")]
    NotFound { grade: String, kind: GameKind },

    #[error("Level store error: {0}")]
    Store(String),
}

/// Read-only lookup of the level a grade is currently assigned
#[async_trait]
pub trait LevelResolver: Send + Sync {
    async fn resolve_active_level(
        &self,
        grade: &str,
        kind: GameKind,
    ) -> Result<LevelDefinition, ResolveError>;
}

/// In-memory level catalogue for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryLevelResolver {
    levels: Arc<RwLock<Vec<LevelDefinition>>>,
}

impl InMemoryLevelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with a pre-populated catalogue
    pub fn with_levels(levels: Vec<LevelDefinition>) -> Self {
        Self {
            levels: Arc::new(RwLock::new(levels)),
        }
    }

    pub async fn add_level(&self, level: LevelDefinition) {
        self.levels.write().await.push(level);
    }
}

#[async_trait]
impl LevelResolver for InMemoryLevelResolver {
    #[instrument(skip(self))]
    async fn resolve_active_level(
        &self,
        grade: &str,
        kind: GameKind,
    ) -> Result<LevelDefinition, ResolveError> {
        let levels = self.levels.read().await;
        let level = levels
            .iter()
            .find(|level| level.active && level.grade == grade && level.kind() == kind)
            .cloned();

        match level {
            Some(level) => {
                debug!(level_id = %level.id, "Resolved active level");
                Ok(level)
            }
            None => {
                debug!("No active level configured");
                Err(ResolveError::NotFound {
                    grade: grade.to_string(),
                    kind,
                })
            }
        }
    }
}
