//! Host-driven scheduler
//!
//! Nothing fires on its own: the host calls `fire` whenever one interval has
//! passed on its own clock (a frame loop, a test, a replay).

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use super::scheduler::{Scheduler, TaskHandle, TickCallback};

struct ManualTask {
    interval: Duration,
    cancelled: AtomicBool,
    callback: Mutex<TickCallback>,
}

/// Scheduler whose ticks are fired explicitly by the host
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<Vec<Arc<ManualTask>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks scheduled and not yet cancelled
    pub fn active_tasks(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Intervals of the live tasks, in scheduling order
    pub fn intervals(&self) -> Vec<Duration> {
        lock(&self.tasks).iter().map(|task| task.interval).collect()
    }

    /// Run one tick of every live task. Returns how many callbacks ran.
    pub fn fire(&self) -> usize {
        // Callbacks may cancel tasks, so run them without holding the list
        let live: Vec<Arc<ManualTask>> = lock(&self.tasks).clone();
        let mut fired = 0;
        for task in live {
            if task.cancelled.load(Ordering::SeqCst) {
                continue;
            }
            let mut callback = lock(&task.callback);
            (&mut **callback)();
            fired += 1;
        }
        fired
    }

    /// Fire `times` ticks in a row, returning the total callbacks run
    pub fn fire_times(&self, times: usize) -> usize {
        (0..times).map(|_| self.fire()).sum()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TaskHandle {
        let task = Arc::new(ManualTask {
            interval,
            cancelled: AtomicBool::new(false),
            callback: Mutex::new(callback),
        });
        lock(&self.tasks).push(Arc::clone(&task));

        let tasks = Arc::clone(&self.tasks);
        TaskHandle::new(move || {
            task.cancelled.store(true, Ordering::SeqCst);
            lock(&tasks).retain(|live| !Arc::ptr_eq(live, &task));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fire_runs_live_tasks_only() {
        let scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let mut first = scheduler.schedule_repeating(
            Duration::from_secs(1),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&count);
        let _second = scheduler.schedule_repeating(
            Duration::from_millis(250),
            Box::new(move || {
                counter.fetch_add(10, Ordering::SeqCst);
            }),
        );

        assert_eq!(scheduler.active_tasks(), 2);
        assert_eq!(scheduler.fire(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 11);

        first.cancel();
        assert_eq!(scheduler.active_tasks(), 1);
        assert_eq!(scheduler.intervals(), vec![Duration::from_millis(250)]);
        assert_eq!(scheduler.fire_times(2), 2);
        assert_eq!(count.load(Ordering::SeqCst), 31);
    }

    #[test]
    fn test_callback_can_cancel_its_own_task() {
        let scheduler = ManualScheduler::new();
        let slot: Arc<Mutex<Option<TaskHandle>>> = Arc::new(Mutex::new(None));

        let own = Arc::clone(&slot);
        let handle = scheduler.schedule_repeating(
            Duration::from_secs(1),
            Box::new(move || {
                let taken = own.lock().unwrap().take();
                drop(taken);
            }),
        );
        *slot.lock().unwrap() = Some(handle);

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.active_tasks(), 0);
        assert_eq!(scheduler.fire(), 0);
    }
}
