//! Timer service injected into every engine.
//!
//! Engines never own a callback. They ask the scheduler for a [`TimerId`] and
//! receive that id back through `on_timer` when it fires, on the same logical
//! thread as user input. An id the engine no longer holds is ignored, which
//! makes late firings after a cancel harmless.

mod countdown;
mod manual;
mod tokio_scheduler;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use countdown::{Countdown, TickOutcome};
pub use manual::ManualScheduler;
pub use tokio_scheduler::TokioScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler: Send + Sync {
    /// Fires every `period`, first after one full period
    fn schedule_repeating(&self, period: Duration) -> TimerId;
    /// Fires once after `delay`
    fn schedule_once(&self, delay: Duration) -> TimerId;
    /// Stops a timer. Unknown or already finished ids are ignored.
    fn cancel(&self, id: TimerId);
}

#[derive(Debug, Default)]
pub(crate) struct TimerIds(AtomicU64);

impl TimerIds {
    pub(crate) fn next(&self) -> TimerId {
        TimerId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
