use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::debug;

use super::{Scheduler, TimerId, TimerIds};

type TaskMap = Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>;

/// Runtime scheduler backed by tokio timers.
///
/// Every firing is sent down the channel returned from [`TokioScheduler::new`];
/// the game driver reads it in the same loop as user commands. Must be used
/// from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    ids: Arc<TimerIds>,
    fired: mpsc::UnboundedSender<TimerId>,
    tasks: TaskMap,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            ids: Arc::new(TimerIds::default()),
            fired,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        };
        (scheduler, receiver)
    }

    fn track(&self, id: TimerId, handle: JoinHandle<()>) {
        with_tasks(&self.tasks, |tasks| {
            tasks.insert(id, handle);
        });
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration) -> TimerId {
        let id = self.ids.next();
        let fired = self.fired.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if fired.send(id).is_err() {
                    debug!(timer = id.value(), "Timer receiver dropped, stopping ticker");
                    break;
                }
            }
        });

        self.track(id, handle);
        id
    }

    fn schedule_once(&self, delay: Duration) -> TimerId {
        let id = self.ids.next();
        let fired = self.fired.clone();
        let tasks = self.tasks.clone();

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = fired.send(id);
            with_tasks(&tasks, |tasks| {
                tasks.remove(&id);
            });
        });

        self.track(id, handle);
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = with_tasks(&self.tasks, |tasks| tasks.remove(&id)) {
            handle.abort();
            debug!(timer = id.value(), "Timer cancelled");
        }
    }
}

fn with_tasks<R>(
    tasks: &TaskMap,
    f: impl FnOnce(&mut HashMap<TimerId, JoinHandle<()>>) -> R,
) -> R {
    let mut guard = match tasks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut guard)
}
