//! Steps every engine shares: picking the level to play, resolving its
//! configuration and recording a completion.

use tracing::{info, warn};

use super::GameError;
use crate::config::SequenceEndPolicy;
use crate::level::{GameKind, LevelParams, ResolveError};
use crate::shared::{GameContext, Notice};

/// Chooses the progression level to play, creating the record on first play.
///
/// If progress cannot be read the play still goes ahead on the requested
/// level (or the first one) and a notice is raised.
pub(crate) async fn select_level(
    ctx: &GameContext,
    kind: GameKind,
    requested: Option<String>,
    notices: &mut Vec<Notice>,
) -> Result<String, GameError> {
    match ctx.tracker.load_or_initialize(&ctx.student.id, kind).await {
        Ok(progress) => match requested {
            Some(level_id) if !progress.is_unlocked(&level_id) => {
                Err(GameError::LevelLocked(level_id))
            }
            Some(level_id) => Ok(level_id),
            None => Ok(progress.current_level),
        },
        Err(e) => {
            warn!(student_id = %ctx.student.id, error = %e, "Progress unavailable, playing without it");
            notices.push(Notice::PersistenceFailure(e.to_string()));
            let fallback = ctx.tracker.sequences().first(kind).unwrap_or_default();
            Ok(requested.unwrap_or_else(|| fallback.to_string()))
        }
    }
}

/// Parameters of the grade's active level, `None` when there is none
pub(crate) async fn resolve_params(ctx: &GameContext, kind: GameKind) -> Option<LevelParams> {
    match ctx
        .resolver
        .resolve_active_level(&ctx.student.grade, kind)
        .await
    {
        Ok(level) => {
            info!(level_id = %level.id, name = %level.name, "Using active level");
            Some(level.params)
        }
        Err(ResolveError::NotFound { .. }) => None,
        Err(e) => {
            warn!(error = %e, "Level resolution failed");
            None
        }
    }
}

/// Completes `level_id` and applies the end-of-sequence policy.
///
/// Returns the level the student moves on to.
pub(crate) async fn record_completion(
    ctx: &GameContext,
    kind: GameKind,
    level_id: &str,
    notices: &mut Vec<Notice>,
) -> Option<String> {
    let student_id = &ctx.student.id;
    let outcome = match ctx.tracker.complete_level(student_id, kind, level_id).await {
        Ok(None) if ctx.config.sequence_end == SequenceEndPolicy::Loop => ctx
            .tracker
            .restart_sequence(student_id, kind)
            .await
            .map(|progress| Some(progress.current_level)),
        other => other,
    };

    match outcome {
        Ok(next) => next,
        Err(e) => {
            warn!(student_id = %student_id, level_id = %level_id, error = %e, "Could not record completion");
            notices.push(Notice::PersistenceFailure(e.to_string()));
            None
        }
    }
}
