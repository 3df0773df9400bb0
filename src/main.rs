use std::sync::Arc;

use classroom_games::game::PuzzleAction;
use classroom_games::level::{InMemoryLevelResolver, LevelParams, PuzzleParams};
use classroom_games::progress::InMemoryProgressStore;
use classroom_games::report::InMemoryResultSink;
use classroom_games::{
    AppError, GameConfig, GameContext, GameDriver, GameKind, LevelDefinition, ProgressTracker,
    PuzzleEngine, ResultReporter, Student, TokioScheduler,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_games=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting classroom games demo");

    let config = GameConfig::from_env()?;
    let resolver = Arc::new(InMemoryLevelResolver::with_levels(vec![LevelDefinition {
        id: "farm-animals".to_string(),
        name: "Farm animals".to_string(),
        grade: "2".to_string(),
        active: true,
        params: LevelParams::Puzzle(PuzzleParams {
            rows: 2,
            cols: 3,
            time_limit: 120,
            image: "farm.png".to_string(),
        }),
    }]));
    let tracker = Arc::new(ProgressTracker::new(
        Arc::new(InMemoryProgressStore::new()),
        config.sequences.clone(),
    ));
    let sink = InMemoryResultSink::new();
    let reporter = ResultReporter::spawn(Arc::new(sink.clone()));
    let (scheduler, timers) = TokioScheduler::new();

    let ctx = GameContext::new(
        Student::new("demo-student", "2"),
        resolver,
        tracker.clone(),
        reporter,
        Arc::new(scheduler),
        config,
    );
    let (driver, handle) = GameDriver::new(PuzzleEngine::new(ctx), timers);
    let running = tokio::spawn(driver.run());

    handle.start(None).await?;

    // Put each slot's own piece into it, left to right
    let slots = handle.snapshot().pieces.len();
    for slot in 0..slots {
        let snapshot = handle.snapshot();
        if snapshot.is_terminal() {
            break;
        }
        let Some(from) = snapshot.pieces.iter().position(|piece| piece.index == slot) else {
            continue;
        };
        if from != slot {
            handle.act(PuzzleAction::Swap { from, to: slot }).await?;
        }
    }

    let snapshot = handle.snapshot();
    match snapshot.rating {
        Some(rating) => info!(
            phase = %snapshot.phase,
            moves = snapshot.moves,
            score = rating.score,
            stars = rating.stars,
            next_level = ?snapshot.next_level,
            "Puzzle demo finished"
        ),
        None => warn!(phase = %snapshot.phase, "Puzzle demo ended without a rating"),
    }

    handle.teardown()?;
    if running.await.is_err() {
        warn!("Game driver task panicked");
    }

    // Let the reporter drain its queue
    tokio::task::yield_now().await;
    info!(results = sink.result_count().await, "Results submitted");

    if let Some(progress) = tracker.load("demo-student", GameKind::Puzzle).await? {
        info!(current_level = %progress.current_level, "Progress saved");
    }
    Ok(())
}
