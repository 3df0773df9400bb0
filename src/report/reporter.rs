use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::models::GameResult;
use super::sink::{ReportError, ResultSink};

const FAILURE_CHANNEL_CAPACITY: usize = 32;

/// Notice published when the sink rejects a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFailure {
    pub result_id: Uuid,
    pub student_id: String,
    pub error: ReportError,
}

/// Fire-and-forget front of the result sink.
///
/// `report` only queues the result; a background task drains the queue into
/// the sink, so a slow or failing sink never holds up an engine.
#[derive(Debug, Clone)]
pub struct ResultReporter {
    queue: mpsc::UnboundedSender<GameResult>,
    failures: broadcast::Sender<ReportFailure>,
}

impl ResultReporter {
    /// Starts the submission task. Must be called within a tokio runtime.
    pub fn spawn(sink: Arc<dyn ResultSink>) -> Self {
        let (queue, mut pending) = mpsc::unbounded_channel::<GameResult>();
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        let failure_sender = failures.clone();

        tokio::spawn(async move {
            while let Some(result) = pending.recv().await {
                let result_id = result.id;
                let student_id = result.student_id.clone();

                match sink.submit(result).await {
                    Ok(()) => {
                        debug!(result_id = %result_id, "Game result submitted");
                    }
                    Err(e) => {
                        error!(result_id = %result_id, error = %e, "Game result submission failed");
                        let _ = failure_sender.send(ReportFailure {
                            result_id,
                            student_id,
                            error: e,
                        });
                    }
                }
            }
            debug!("Result reporter queue closed");
        });

        Self { queue, failures }
    }

    pub fn report(&self, result: GameResult) {
        info!(
            result_id = %result.id,
            student_id = %result.student_id,
            kind = %result.game_kind,
            score = result.score,
            stars = result.stars,
            "Reporting game result"
        );
        if self.queue.send(result).is_err() {
            warn!("Result reporter task has stopped, dropping result");
        }
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<ReportFailure> {
        self.failures.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{GameMetrics, InMemoryResultSink};
    use crate::scoring::Rating;
    use async_trait::async_trait;
    use std::time::Duration;

    struct RejectingSink;

    #[async_trait]
    impl ResultSink for RejectingSink {
        async fn submit(&self, _result: GameResult) -> Result<(), ReportError> {
            Err(ReportError::Submission("store offline".into()))
        }
    }

    fn sample_result() -> GameResult {
        GameResult::new(
            "s1",
            "level-1",
            Rating::new(18, 3),
            true,
            GameMetrics::Puzzle {
                moves: 4,
                time_used: Some(10),
            },
        )
    }

    #[tokio::test]
    async fn queued_result_reaches_sink() {
        let sink = InMemoryResultSink::new();
        let reporter = ResultReporter::spawn(Arc::new(sink.clone()));

        reporter.report(sample_result());

        tokio::time::timeout(Duration::from_secs(1), async {
            while sink.result_count().await == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("result should be submitted");
        assert_eq!(sink.results().await[0].score, 18);
    }

    #[tokio::test]
    async fn failures_are_broadcast() {
        let reporter = ResultReporter::spawn(Arc::new(RejectingSink));
        let mut failures = reporter.subscribe_failures();

        let result = sample_result();
        let result_id = result.id;
        reporter.report(result);

        let failure = tokio::time::timeout(Duration::from_secs(1), failures.recv())
            .await
            .expect("failure should be published")
            .unwrap();
        assert_eq!(failure.result_id, result_id);
        assert_eq!(failure.student_id, "s1");
    }
}
