mod utils;

use std::sync::Arc;
use std::time::Duration;

use classroom_games::{
    game::{GameError, MemoryAction, MemoryEngine, MemoryPhase, PuzzleEngine, PuzzlePhase},
    AppError, GameContext, GameDriver, TimerId, TokioScheduler,
};
use tokio::sync::mpsc;
use utils::{memory_level, puzzle_level, TestSetupBuilder};

/// Swaps the manual scheduler for a tokio one the driver can listen to
fn with_tokio_timers(ctx: &GameContext) -> (GameContext, mpsc::UnboundedReceiver<TimerId>) {
    let (scheduler, timers) = TokioScheduler::new();
    let mut ctx = ctx.clone();
    ctx.scheduler = Arc::new(scheduler);
    (ctx, timers)
}

#[tokio::test(start_paused = true)]
async fn driver_delivers_countdown_ticks() {
    let setup = TestSetupBuilder::new()
        .with_level(puzzle_level(2, 2, 3))
        .with_shuffle(vec![1, 0, 3, 2])
        .build();
    let (ctx, timers) = with_tokio_timers(&setup.ctx);
    let (driver, handle) = GameDriver::new(PuzzleEngine::new(ctx), timers);
    let running = tokio::spawn(driver.run());

    handle.start(None).await.unwrap();
    assert_eq!(handle.snapshot().remaining_seconds, Some(3));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(handle.snapshot().remaining_seconds, Some(2));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(handle.snapshot().phase, PuzzlePhase::TimedOut);

    handle.teardown().unwrap();
    let engine = running.await.unwrap();
    assert_eq!(engine.phase(), PuzzlePhase::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn driver_settles_memory_mismatch() {
    let setup = TestSetupBuilder::new()
        .with_level(memory_level(2, 0, 0))
        .with_shuffle(vec![0, 2, 1, 3])
        .build();
    let (ctx, timers) = with_tokio_timers(&setup.ctx);
    let (driver, handle) = GameDriver::new(MemoryEngine::new(ctx), timers);
    let running = tokio::spawn(driver.run());

    handle.start(None).await.unwrap();
    handle.act(MemoryAction::Flip(0)).await.unwrap();
    handle.act(MemoryAction::Flip(1)).await.unwrap();
    assert!(handle.snapshot().settling);

    let rejected = handle.act(MemoryAction::Flip(2)).await;
    assert!(matches!(
        rejected,
        Err(AppError::Game(GameError::FlipPending))
    ));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snapshot = handle.snapshot();
    assert!(!snapshot.settling);
    assert!(snapshot.cards.iter().all(|card| !card.face_up));

    handle.act(MemoryAction::Flip(0)).await.unwrap();
    handle.act(MemoryAction::Flip(2)).await.unwrap();
    handle.act(MemoryAction::Flip(1)).await.unwrap();
    handle.act(MemoryAction::Flip(3)).await.unwrap();
    assert_eq!(handle.snapshot().phase, MemoryPhase::Won);

    handle.teardown().unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_transition() {
    let setup = TestSetupBuilder::new()
        .with_level(puzzle_level(1, 2, 0))
        .with_shuffle(vec![1, 0])
        .build();
    let (ctx, timers) = with_tokio_timers(&setup.ctx);
    let (driver, handle) = GameDriver::new(PuzzleEngine::new(ctx), timers);
    let mut updates = handle.subscribe();
    let running = tokio::spawn(driver.run());

    handle.start(None).await.unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().phase, PuzzlePhase::Playing);

    handle
        .act(classroom_games::game::PuzzleAction::Swap { from: 0, to: 1 })
        .await
        .unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().phase, PuzzlePhase::Won);

    handle.teardown().unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stopped_driver_rejects_commands() {
    let setup = TestSetupBuilder::new()
        .with_level(puzzle_level(2, 2, 30))
        .with_shuffle(vec![1, 0, 3, 2])
        .build();
    let (ctx, timers) = with_tokio_timers(&setup.ctx);
    let (driver, handle) = GameDriver::new(PuzzleEngine::new(ctx), timers);
    let running = tokio::spawn(driver.run());

    handle.start(None).await.unwrap();
    handle.teardown().unwrap();
    let engine = running.await.unwrap();
    assert_eq!(engine.phase(), PuzzlePhase::Playing);

    assert!(matches!(
        handle.start(None).await,
        Err(AppError::DriverStopped)
    ));
    assert!(matches!(handle.teardown(), Err(AppError::DriverStopped)));
}
