use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::types::{datetime_to_millis, millis_to_datetime};

type Task = Box<dyn FnOnce()>;

/// Handle to a scheduled task; ordering is by due time, then scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    due_ms: i64,
    seq: u64,
}

struct LoopState {
    now_ms: i64,
    next_seq: u64,
    timers: BTreeMap<TimerId, Task>,
}

/// Single-threaded timer queue over a manual clock.
///
/// Stands in for the browser event loop: nothing runs until the host
/// advances the clock, and due tasks then run one at a time in order, each
/// observing the clock set to its own due time.
#[derive(Clone)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl EventLoop {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoopState {
                now_ms: now.timestamp_millis(),
                next_seq: 0,
                timers: BTreeMap::new(),
            })),
        }
    }

    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms as f64
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        let now_ms = self.state.borrow().now_ms;
        DateTime::from_timestamp_millis(now_ms).unwrap_or_default()
    }

    /// Schedules `task` after `delay_ms`; negative or non-finite delays run at the current instant.
    pub fn set_timeout(&self, delay_ms: f64, task: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        let delay = if delay_ms.is_finite() && delay_ms > 0.0 {
            delay_ms.round() as i64
        } else {
            0
        };
        let id = TimerId {
            due_ms: state.now_ms + delay,
            seq: state.next_seq,
        };
        state.next_seq += 1;
        state.timers.insert(id, Box::new(task));
        id
    }

    /// Cancels a pending task. Returns `false` if it already ran or was cancelled.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.state.borrow_mut().timers.remove(&id).is_some()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Runs every task due within `duration` and leaves the clock at its end.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, duration: Duration) -> usize {
        let target = self.state.borrow().now_ms + duration.as_millis() as i64;
        self.run_until(target)
    }

    /// Runs every task due at or before `time`. Never moves the clock backwards.
    pub fn advance_to(&self, time: DateTime<Utc>) -> usize {
        self.run_until(datetime_to_millis(time) as i64)
    }

    fn run_until(&self, target_ms: i64) -> usize {
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.state.borrow_mut();
                let LoopState { now_ms, timers, .. } = &mut *state;
                match timers.first_entry() {
                    Some(entry) if entry.key().due_ms <= target_ms => {
                        let (id, task) = entry.remove_entry();
                        *now_ms = (*now_ms).max(id.due_ms);
                        task
                    }
                    _ => {
                        *now_ms = (*now_ms).max(target_ms);
                        break;
                    }
                }
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, now = ?millis_to_datetime(self.now_ms()), "event loop advanced");
        }
        ran
    }
}
