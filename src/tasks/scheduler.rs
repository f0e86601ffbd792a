//! Repeating tick scheduling

use std::{fmt, time::Duration};

use tokio::{
    runtime::Handle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Work run on every tick of a repeating schedule
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// Source of repeating, cancellable ticks
pub trait Scheduler: Send + Sync {
    /// Run `callback` every `interval`, first one `interval` from now, until
    /// the returned handle is cancelled or dropped.
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TaskHandle;
}

/// Owned handle to a scheduled task. Dropping it cancels the task.
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the task. Cancelling twice is a no-op.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Scheduler backed by `tokio::time::interval` on a runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut callback: TickCallback) -> TaskHandle {
        let first = Instant::now() + period;
        let task = self.runtime.spawn(async move {
            let mut interval = interval_at(first, period);
            // A stalled runtime delays the countdown instead of bursting ticks
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                callback();
            }
        });

        debug!("Scheduled repeating tick every {:?}", period);
        TaskHandle::new(move || {
            task.abort();
            debug!("Repeating tick cancelled");
        })
    }
}
