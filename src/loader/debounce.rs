//! Debounce gate.
//!
//! Coalesces bursts of scheduled work into at most one run per quiet period.
//! Only the most recently scheduled closure ever executes; earlier closures are
//! dropped unexecuted when they are superseded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::util::lock::mutex_lock;

const SOURCE: &str = "loader::debounce";

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Holds at most one pending timer.
pub struct DebounceGate {
    delay: Duration,
    slot: Arc<Mutex<TimerSlot>>,
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Run `run` now when `immediate` is set or the delay is zero, otherwise
    /// arm a timer for it. Any previously armed timer is cancelled either way.
    ///
    /// A fired timer executes `run` while holding the slot, so a concurrent
    /// `schedule` either cancels it first or waits until it has finished.
    /// Must be called from within a tokio runtime when a timer is armed.
    pub fn schedule<F>(&self, immediate: bool, run: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = mutex_lock(&self.slot, SOURCE, "schedule");
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(timer) = slot.timer.take() {
            timer.abort();
            debug!(generation = slot.generation, "Superseded pending debounce timer");
        }

        if immediate || self.delay.is_zero() {
            run();
            return;
        }

        let generation = slot.generation;
        let delay = self.delay;
        let shared = Arc::clone(&self.slot);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = mutex_lock(&shared, SOURCE, "fire");
            if slot.generation != generation {
                return;
            }
            slot.timer = None;
            run();
        }));
        debug!(generation, ?delay, "Armed debounce timer");
    }

    /// Cancel the pending timer. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = mutex_lock(&self.slot, SOURCE, "cancel");
        slot.generation = slot.generation.wrapping_add(1);
        match slot.timer.take() {
            Some(timer) => {
                let pending = !timer.is_finished();
                timer.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        mutex_lock(&self.slot, SOURCE, "is_pending")
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}
