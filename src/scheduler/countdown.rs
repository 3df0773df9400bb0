use std::time::Duration;

use super::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not this countdown's timer, or the countdown is stopped
    Ignored,
    Ticked,
    /// Remaining time just reached zero
    Expired,
}

/// Seconds-resolution countdown driven by a repeating scheduler timer.
///
/// A limit of zero means unlimited: `start` schedules nothing and the
/// countdown never expires.
#[derive(Debug, Clone)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    timer: Option<TimerId>,
}

impl Countdown {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit,
            timer: None,
        }
    }

    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// `None` when unlimited
    pub fn remaining(&self) -> Option<u32> {
        self.is_limited().then_some(self.remaining)
    }

    /// `None` when unlimited
    pub fn elapsed(&self) -> Option<u32> {
        self.is_limited().then(|| self.limit - self.remaining)
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Starts ticking, cancelling any ticker this countdown already owns
    pub fn start(&mut self, scheduler: &dyn Scheduler, period: Duration) {
        self.stop(scheduler);
        if self.is_limited() && self.remaining > 0 {
            self.timer = Some(scheduler.schedule_repeating(period));
        }
    }

    /// Cancels the ticker. Safe to call repeatedly, cancels at most once.
    pub fn stop(&mut self, scheduler: &dyn Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
    }

    pub fn on_timer(&mut self, id: TimerId) -> TickOutcome {
        if self.timer != Some(id) {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked
        }
    }
}
