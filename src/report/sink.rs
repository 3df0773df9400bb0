use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::models::GameResult;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Result submission failed: {0}")]
    Submission(String),
}

/// External collaborator that persists terminal results
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit(&self, result: GameResult) -> Result<(), ReportError>;
}

/// In-memory implementation of ResultSink for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultSink {
    results: Arc<RwLock<Vec<GameResult>>>,
}

impl InMemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn results(&self) -> Vec<GameResult> {
        self.results.read().await.clone()
    }

    pub async fn result_count(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl ResultSink for InMemoryResultSink {
    #[instrument(skip(self, result), fields(result_id = %result.id))]
    async fn submit(&self, result: GameResult) -> Result<(), ReportError> {
        debug!(student_id = %result.student_id, "Storing game result in memory");
        self.results.write().await.push(result);
        Ok(())
    }
}
