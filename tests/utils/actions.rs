use std::time::Duration;

use classroom_games::{
    game::GameEngine, report::InMemoryResultSink, GameResult, ManualScheduler,
};

const STEP: Duration = Duration::from_millis(100);

/// Moves virtual time forward in small steps, delivering every firing to
/// the engine as it comes due
pub async fn advance<E: GameEngine>(engine: &mut E, scheduler: &ManualScheduler, by: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < by {
        let step = STEP.min(by - elapsed);
        for id in scheduler.advance(step) {
            engine.on_timer(id).await;
        }
        elapsed += step;
    }
}

pub async fn advance_seconds<E: GameEngine>(
    engine: &mut E,
    scheduler: &ManualScheduler,
    seconds: u64,
) {
    advance(engine, scheduler, Duration::from_secs(seconds)).await;
}

/// Waits for the reporter's background task to hand `count` results to the sink
pub async fn wait_for_results(sink: &InMemoryResultSink, count: usize) -> Vec<GameResult> {
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while sink.result_count().await < count {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {} results", count);
    sink.results().await
}
