use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use classroom_games::{
    progress::{ProgressStore, StoreError},
    report::{GameResult, ReportError, ResultSink},
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Store whose backend is always down
#[derive(Debug, Default)]
pub struct FailingProgressStore;

#[async_trait]
impl ProgressStore for FailingProgressStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Sink that rejects every submission and counts the attempts
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultSink for FailingSink {
    async fn submit(&self, _result: GameResult) -> Result<(), ReportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ReportError::Submission("sink rejected result".to_string()))
    }
}
