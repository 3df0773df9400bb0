use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::{
    errors::{ProgressError, StoreError},
    models::{ProgressKey, StudentProgress},
    repository::ProgressStore,
};
use crate::config::LevelSequences;
use crate::level::GameKind;

/// Owns every student's progression records on top of a durable store.
///
/// Reads go through an in-memory cache that is refreshed only after a
/// successful save and evicted when a save fails. Mutations are serialized
/// per (student, game) key and persist the whole record before returning.
pub struct ProgressTracker {
    store: Arc<dyn ProgressStore>,
    sequences: LevelSequences,
    cache: RwLock<HashMap<ProgressKey, StudentProgress>>,
    key_locks: RwLock<HashMap<ProgressKey, Arc<AsyncMutex<()>>>>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn ProgressStore>, sequences: LevelSequences) -> Self {
        Self {
            store,
            sequences,
            cache: RwLock::new(HashMap::new()),
            key_locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn sequences(&self) -> &LevelSequences {
        &self.sequences
    }

    /// Puts the student on the first level, overwriting any existing record
    #[instrument(skip(self))]
    pub async fn initialize(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<StudentProgress, ProgressError> {
        let key = ProgressKey::new(student_id, kind);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        self.initialize_locked(student_id, kind).await
    }

    pub async fn reset(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<StudentProgress, ProgressError> {
        info!(student_id = %student_id, kind = %kind, "Resetting progress");
        self.initialize(student_id, kind).await
    }

    /// Restores a record. Corrupt or inconsistent records come back as `None`.
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<Option<StudentProgress>, ProgressError> {
        let key = ProgressKey::new(student_id, kind);

        if let Some(progress) = self.cache.read().await.get(&key) {
            return Ok(Some(progress.clone()));
        }

        let Some(raw) = self.store.get(&key.to_string()).await? else {
            debug!("No stored progress");
            return Ok(None);
        };

        let progress = match serde_json::from_str::<StudentProgress>(&raw) {
            Ok(progress) if progress.key() == key && progress.is_consistent() => progress,
            Ok(_) => {
                warn!(key = %key, "Stored progress violates its invariants, treating as absent");
                return Ok(None);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Stored progress is malformed, treating as absent");
                return Ok(None);
            }
        };

        self.cache.write().await.insert(key, progress.clone());
        Ok(Some(progress))
    }

    /// Loads the record, creating it on first play
    pub async fn load_or_initialize(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<StudentProgress, ProgressError> {
        let key = ProgressKey::new(student_id, kind);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        match self.load(student_id, kind).await? {
            Some(progress) => Ok(progress),
            None => self.initialize_locked(student_id, kind).await,
        }
    }

    /// Marks `level_id` completed and unlocks the level after it.
    ///
    /// Returns the newly current level, or `None` when `level_id` is the last
    /// in the sequence. Repeating the call for the same level returns the same
    /// next level without duplicating the completion.
    #[instrument(skip(self))]
    pub async fn complete_level(
        &self,
        student_id: &str,
        kind: GameKind,
        level_id: &str,
    ) -> Result<Option<String>, ProgressError> {
        let key = ProgressKey::new(student_id, kind);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        let mut progress = match self.load(student_id, kind).await? {
            Some(progress) => progress,
            None => self.initialize_locked(student_id, kind).await?,
        };

        if !progress.level_sequence.iter().any(|level| level == level_id) {
            return Err(ProgressError::UnknownLevel {
                kind,
                level_id: level_id.to_string(),
            });
        }

        progress.mark_completed(level_id);
        let next = progress.next_after(level_id);
        if let Some(next) = &next {
            progress.unlock_and_enter(next);
        }

        self.persist(&progress).await?;

        info!(
            student_id = %student_id,
            level_id = %level_id,
            next_level = ?next,
            "Level completed"
        );
        Ok(next)
    }

    /// Moves the student back to the first level without forgetting anything
    #[instrument(skip(self))]
    pub async fn restart_sequence(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<StudentProgress, ProgressError> {
        let key = ProgressKey::new(student_id, kind);
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        let mut progress = match self.load(student_id, kind).await? {
            Some(progress) => progress,
            None => return self.initialize_locked(student_id, kind).await,
        };

        let first = progress
            .level_sequence
            .first()
            .cloned()
            .ok_or(ProgressError::EmptySequence(kind))?;
        progress.unlock_and_enter(&first);

        self.persist(&progress).await?;
        Ok(progress)
    }

    /// Pure lookup of the level after `current_level_id` in the configured sequence
    pub fn next_level(&self, kind: GameKind, current_level_id: &str) -> Option<String> {
        self.sequences
            .next_after(kind, current_level_id)
            .map(str::to_string)
    }

    async fn initialize_locked(
        &self,
        student_id: &str,
        kind: GameKind,
    ) -> Result<StudentProgress, ProgressError> {
        let progress =
            StudentProgress::first_level(student_id, kind, self.sequences.sequence(kind))
                .ok_or(ProgressError::EmptySequence(kind))?;

        self.persist(&progress).await?;
        debug!(level_id = %progress.current_level, "Initialized progress");
        Ok(progress)
    }

    async fn persist(&self, progress: &StudentProgress) -> Result<(), ProgressError> {
        let key = progress.key();
        let raw = serde_json::to_string(progress)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        match self.store.set(&key.to_string(), raw).await {
            Ok(()) => {
                self.cache.write().await.insert(key, progress.clone());
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to persist progress");
                self.cache.write().await.remove(&key);
                Err(e.into())
            }
        }
    }

    async fn key_lock(&self, key: &ProgressKey) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.key_locks.read().await;
            if let Some(lock) = guard.get(key) {
                return lock.clone();
            }
        }

        let mut guard = self.key_locks.write().await;
        // Drop locks nobody holds, so the map only tracks keys in use
        guard.retain(|_, lock| Arc::strong_count(lock) > 1);
        guard
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
