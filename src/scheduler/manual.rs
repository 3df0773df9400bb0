use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{Scheduler, TimerId, TimerIds};

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    due: Duration,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
struct VirtualClock {
    now: Duration,
    timers: BTreeMap<TimerId, PendingTimer>,
}

/// Virtual-time scheduler. Nothing fires until [`ManualScheduler::advance`]
/// is called, which returns the ids that came due in firing order.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    ids: TimerIds,
    clock: Mutex<VirtualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.with_clock(|clock| clock.now)
    }

    pub fn pending(&self) -> usize {
        self.with_clock(|clock| clock.timers.len())
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.with_clock(|clock| clock.timers.contains_key(&id))
    }

    /// Moves virtual time forward, collecting every firing on the way
    pub fn advance(&self, by: Duration) -> Vec<TimerId> {
        self.with_clock(|clock| {
            let target = clock.now + by;
            let mut fired = Vec::new();

            loop {
                let next = clock
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(id, timer)| (timer.due, **id))
                    .map(|(id, timer)| (*id, *timer));

                let Some((id, timer)) = next else {
                    break;
                };

                clock.now = timer.due;
                fired.push(id);
                match timer.period {
                    Some(period) => {
                        if let Some(entry) = clock.timers.get_mut(&id) {
                            entry.due += period;
                        }
                    }
                    None => {
                        clock.timers.remove(&id);
                    }
                }
            }

            clock.now = target;
            fired
        })
    }

    fn insert(&self, delay: Duration, period: Option<Duration>) -> TimerId {
        let id = self.ids.next();
        self.with_clock(|clock| {
            let due = clock.now + delay;
            clock.timers.insert(id, PendingTimer { due, period });
        });
        id
    }

    fn with_clock<R>(&self, f: impl FnOnce(&mut VirtualClock) -> R) -> R {
        let mut clock = match self.clock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut clock)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration) -> TimerId {
        // A zero period would never let virtual time move past it
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period))
    }

    fn schedule_once(&self, delay: Duration) -> TimerId {
        self.insert(delay, None)
    }

    fn cancel(&self, id: TimerId) {
        self.with_clock(|clock| {
            clock.timers.remove(&id);
        });
    }
}
